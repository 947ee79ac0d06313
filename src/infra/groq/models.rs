/// A chat model offered in the model picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatModel {
    pub id: &'static str,
    pub name: &'static str,
    pub developer: &'static str,
    pub description: &'static str,
}

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

pub static MODELS: &[ChatModel] = &[
    ChatModel {
        id: "llama-3.1-8b-instant",
        name: "Llama 3.1 8B Instant",
        developer: "Meta",
        description: "Fast and efficient for quick responses",
    },
    ChatModel {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B Versatile",
        developer: "Meta",
        description: "High-quality responses with versatility",
    },
    ChatModel {
        id: "meta-llama/llama-guard-4-12b",
        name: "Llama Guard 4 12B",
        developer: "Meta",
        description: "Content moderation and safety",
    },
    ChatModel {
        id: "openai/gpt-oss-120b",
        name: "GPT OSS 120B",
        developer: "OpenAI",
        description: "Large model for complex tasks",
    },
    ChatModel {
        id: "openai/gpt-oss-20b",
        name: "GPT OSS 20B",
        developer: "OpenAI",
        description: "Balanced performance and efficiency",
    },
    ChatModel {
        id: "groq/compound",
        name: "Compound",
        developer: "Groq",
        description: "System with models and tools",
    },
    ChatModel {
        id: "groq/compound-mini",
        name: "Compound Mini",
        developer: "Groq",
        description: "Lightweight system model",
    },
];

pub fn find_model(id: &str) -> Option<&'static ChatModel> {
    MODELS.iter().find(|m| m.id == id)
}
