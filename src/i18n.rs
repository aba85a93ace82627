//! User-facing strings in the two supported languages.

use crate::config::AutoChat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    SimplifiedChinese,
}

impl Language {
    /// Only mainland Chinese gets the Chinese map; every other tag is English.
    pub fn from_locale(locale: &str) -> Self {
        if locale.eq_ignore_ascii_case("zh-CN") {
            Language::SimplifiedChinese
        } else {
            Language::English
        }
    }
}

/// Message map keyed by field name.
#[derive(Debug, Clone, Copy)]
pub struct Messages {
    pub choose_question: &'static str,
    pub set_api: &'static str,
    pub set_api_success: &'static str,
    pub choose_model: &'static str,
    pub set_model_success: &'static str,
    pub set_system_prompt: &'static str,
    pub set_system_prompt_success: &'static str,
    pub invalid_input: &'static str,
    pub unknown_command: &'static str,
    pub no_models: &'static str,
    pub start_chat: &'static str,
    pub model: &'static str,
    pub system: &'static str,
    pub you: &'static str,
    pub bot: &'static str,
    pub other_settings: &'static str,
    pub auto_enter_chat: &'static str,
    pub on: &'static str,
    pub off: &'static str,
    pub stopped: &'static str,
    pub request_failed: &'static str,
    pub goodbye: &'static str,
}

const EN: Messages = Messages {
    choose_question: "Choose an option:\n1: Set model\n2: Set API link\n3: Set system prompt\n4: Start chat\n5: Other settings\n/exit: Quit\n",
    set_api: "Enter the API link (e.g. http://localhost:11434): ",
    set_api_success: "API link saved.",
    choose_model: "Choose a model:",
    set_model_success: "Model saved.",
    set_system_prompt: "Enter the system prompt: ",
    set_system_prompt_success: "System prompt saved.",
    invalid_input: "Invalid input, please try again.",
    unknown_command: "Unknown option, please choose from the list.",
    no_models: "No models available on the server.",
    start_chat: "Chat started, type /back to return to the menu or /exit to quit",
    model: "model: ",
    system: "System: ",
    you: "You: ",
    bot: "Bot: ",
    other_settings: "1: Toggle auto-enter chat on startup (/back to return) ",
    auto_enter_chat: "Auto-enter chat: ",
    on: "on",
    off: "off",
    stopped: "[stopped]",
    request_failed: "Request failed: ",
    goodbye: "Bye.",
};

const ZH_HANS: Messages = Messages {
    choose_question: "请选择:\n1: 设置模型\n2: 设置 API 地址\n3: 设置系统提示词\n4: 开始聊天\n5: 其他设置\n/exit: 退出\n",
    set_api: "请输入 API 地址 (例如 http://localhost:11434): ",
    set_api_success: "API 地址已保存。",
    choose_model: "请选择模型:",
    set_model_success: "模型已保存。",
    set_system_prompt: "请输入系统提示词: ",
    set_system_prompt_success: "系统提示词已保存。",
    invalid_input: "输入无效, 请重试。",
    unknown_command: "未知选项, 请从列表中选择。",
    no_models: "服务器上没有可用的模型。",
    start_chat: "开始聊天, 输入 /back 返回菜单, 输入 /exit 退出",
    model: "模型: ",
    system: "系统: ",
    you: "你: ",
    bot: "机器人: ",
    other_settings: "1: 切换启动时自动进入聊天 (/back 返回) ",
    auto_enter_chat: "自动进入聊天: ",
    on: "开",
    off: "关",
    stopped: "[已停止]",
    request_failed: "请求失败: ",
    goodbye: "再见。",
};

impl Messages {
    pub fn for_language(language: Language) -> &'static Messages {
        match language {
            Language::English => &EN,
            Language::SimplifiedChinese => &ZH_HANS,
        }
    }

    pub fn resolve(locale: &str) -> &'static Messages {
        Self::for_language(Language::from_locale(locale))
    }

    pub fn auto_chat(&self, value: AutoChat) -> &'static str {
        match value {
            AutoChat::On => self.on,
            AutoChat::Off => self.off,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainland_chinese_selects_chinese() {
        assert_eq!(Language::from_locale("zh-CN"), Language::SimplifiedChinese);
        assert_eq!(Messages::resolve("zh-CN").you, "你: ");
    }

    #[test]
    fn other_locales_fall_back_to_english() {
        for locale in ["en-US", "zh-TW", "fr-FR", "zh", ""] {
            assert_eq!(Language::from_locale(locale), Language::English, "{locale}");
        }
        assert_eq!(Messages::resolve("de-DE").you, "You: ");
    }

    #[test]
    fn auto_chat_labels() {
        let messages = Messages::for_language(Language::English);
        assert_eq!(messages.auto_chat(AutoChat::On), "on");
        assert_eq!(messages.auto_chat(AutoChat::Off), "off");
    }
}
