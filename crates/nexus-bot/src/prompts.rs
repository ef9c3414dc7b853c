//! Prompt documents shipped with the bot

use crate::config::BotConfig;
use nexus_prompt::{FileStore, MemoryStore, PromptEngine};
use tracing::info;

const CHAT_PROMPT: &str = include_str!("../prompts/chat/latest.md");
const STOCK_PROMPT: &str = include_str!("../prompts/stock/latest.md");

/// Store holding the compiled-in `chat` and `stock` prompts
pub fn builtin_store() -> MemoryStore {
    MemoryStore::new()
        .with_document("chat", "latest", CHAT_PROMPT)
        .with_document("stock", "latest", STOCK_PROMPT)
}

/// Prompt engine over `PROMPTS_DIR` when set, the builtin prompts otherwise
pub fn engine(config: &BotConfig) -> PromptEngine {
    match &config.prompts_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Loading prompts from directory");
            PromptEngine::new(FileStore::new(dir))
        }
        None => PromptEngine::new(builtin_store()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_prompts_have_metadata() {
        let engine = PromptEngine::new(builtin_store());
        for name in ["chat", "stock"] {
            let (body, metadata) = engine.get(name, "latest").unwrap();
            assert_eq!(metadata["version"], "1.0");
            assert!(!body.starts_with("---"));
        }
    }

    #[test]
    fn test_builtin_chat_prompt() {
        let engine = PromptEngine::new(builtin_store());
        let prompt = engine.render("chat", &json!({ "message": "What is RSI?" })).unwrap();
        assert!(prompt.ends_with("What is RSI?"));
    }

    #[test]
    fn test_builtin_stock_prompt() {
        let engine = PromptEngine::new(builtin_store());
        let prompt = engine
            .render(
                "stock",
                &json!({
                    "symbol": "2330.TW",
                    "price": "1085.00",
                    "currency": "TWD",
                    "change": "+15.00",
                    "change_percent": "+1.40",
                    "strategy": "general",
                    "indicators": { "ma5": "1070.20", "rsi14": "N/A" },
                    "daily_bars": ["- 2024-04-26: O:1 H:2 L:0.5 C:1.5 V:100", "- 2024-04-29: O:1.5 H:2 L:1 C:2 V:200"],
                    "weekly_bars": [],
                    "monthly_bars": ["- 2024-04-01: O:1 H:2 L:0.5 C:2 V:900"],
                }),
            )
            .unwrap();

        assert!(prompt.contains("analysis of 2330.TW"));
        assert!(prompt.contains("(balanced view across short and medium term)"));
        assert!(prompt.contains("- Price: 1085.00 TWD"));
        assert!(prompt.contains("MA5 / MA10 / MA20 / MA60: 1070.20 /  /  / "));
        assert!(prompt.contains(
            "## Daily bars (most recent 2)\n- 2024-04-26: O:1 H:2 L:0.5 C:1.5 V:100\n- 2024-04-29: O:1.5 H:2 L:1 C:2 V:200\n"
        ));
        assert!(prompt.contains("## Weekly bars (most recent 0)\n\n## Monthly bars"));
    }

    #[test]
    fn test_engine_from_config() {
        let config = BotConfig::builder().gemini_api_key("k").build().unwrap();
        let engine = engine(&config);
        assert!(engine.get("stock", "latest").is_ok());
    }
}
