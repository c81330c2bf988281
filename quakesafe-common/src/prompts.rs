//! Language-model prompts
//!
//! Every prompt is the verdict's canonical message followed by a fixed
//! instruction telling the model how to explain it. Wording is reproduced
//! verbatim and must not be synthesized at runtime.

use crate::verdict::CrackVerdict;

/// Chat trigger that asks for a prediction instead of a conversation
pub const PREDICT_TRIGGER: &str = "我要預測";

/// Reply sent when the chat asks for a prediction
pub const PREDICT_REDIRECT_REPLY: &str = "請在左邊表單輸入要預測的建築物資訊啾咪";

/// Appended to every forwarded chat message
pub const CHAT_LANGUAGE_SUFFIX: &str = " ，請使用繁體中文回答。";

const NO_CRACK_SUFFIX: &str =
    " ，請告訴使用者判定結果，並且回答像是牆壁沒有損壞，房屋應該是安全之類的話。";

const GENERIC_CRACK_SUFFIX: &str =
    " ，請告訴使用者判定結果，並且提醒用戶要注意裂縫的位置跟大小，以及其他要注意的事。";

const X_CRACK_SUFFIX: &str = " ，請告訴使用者判定結果，並且提醒用戶有X型裂縫是房屋損壞的警訊，而且如果斜線在「大梁、大柱或是剪力牆上」，危險度就更高，很有可能成為危樓，然後再提醒用戶需要注意甚麼以及該做的措施。";

const Y_CRACK_SUFFIX: &str = " ，請告訴使用者判定結果，並且提醒用戶有Y型裂縫是房屋損壞的警訊，而且如果斜線在「大梁、大柱或是剪力牆上」，危險度就更高，很有可能成為危樓，然後再提醒用戶需要注意甚麼以及該做的措施。";

/// Instruction appended to a crack verdict's message
pub fn crack_prompt_suffix(verdict: CrackVerdict) -> &'static str {
    match verdict {
        CrackVerdict::NoCrack => NO_CRACK_SUFFIX,
        CrackVerdict::GenericCrack => GENERIC_CRACK_SUFFIX,
        CrackVerdict::XCrack => X_CRACK_SUFFIX,
        CrackVerdict::YCrack => Y_CRACK_SUFFIX,
    }
}

/// Full prompt sent to the language model for a crack verdict
pub fn crack_prompt(verdict: CrackVerdict) -> String {
    format!("{}{}", verdict.message(), crack_prompt_suffix(verdict))
}

/// What to do with an inbound chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatRoute {
    /// Answer locally with a fixed reply, no model call
    Redirect(&'static str),
    /// Forward this prompt to the language model
    Forward(String),
}

/// Decide how to answer a chat message
pub fn route_chat(message: &str) -> ChatRoute {
    if message.contains(PREDICT_TRIGGER) {
        ChatRoute::Redirect(PREDICT_REDIRECT_REPLY)
    } else {
        ChatRoute::Forward(format!("{}{}", message, CHAT_LANGUAGE_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_starts_with_message() {
        for verdict in CrackVerdict::ALL {
            let prompt = crack_prompt(verdict);
            assert!(prompt.starts_with(verdict.message()));
            assert!(prompt.ends_with(crack_prompt_suffix(verdict)));
        }
    }

    #[test]
    fn test_shape_prompts_name_their_shape() {
        assert!(crack_prompt(CrackVerdict::XCrack).contains("X型裂縫是房屋損壞的警訊"));
        assert!(crack_prompt(CrackVerdict::YCrack).contains("Y型裂縫是房屋損壞的警訊"));
        assert!(crack_prompt(CrackVerdict::NoCrack).contains("房屋應該是安全"));
    }

    #[test]
    fn test_predict_trigger_redirects() {
        assert_eq!(
            route_chat("我要預測房價"),
            ChatRoute::Redirect(PREDICT_REDIRECT_REPLY)
        );
    }

    #[test]
    fn test_other_messages_forward_with_suffix() {
        assert_eq!(
            route_chat("地震時該怎麼辦"),
            ChatRoute::Forward("地震時該怎麼辦 ，請使用繁體中文回答。".to_string())
        );
    }

    #[test]
    fn test_partial_trigger_is_forwarded() {
        assert!(matches!(route_chat("我要預"), ChatRoute::Forward(_)));
    }
}
