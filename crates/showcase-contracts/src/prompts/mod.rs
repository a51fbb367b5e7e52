use rand::Rng;

pub const SURPRISE_ME_PROMPTS: &[&str] = &[
    "an armchair in the shape of an avocado",
    "a surrealist dream-like oil painting by Salvador Dalí of a cat playing checkers",
    "teddy bears shopping for groceries in Japan, ukiyo-e",
    "an oil painting by Matisse of a humanoid robot playing chess",
    "panda mad scientist mixing sparkling chemicals, digital art",
    "a macro 35mm photograph of two mice in Hawaii, they're each wearing tiny swimsuits and are carrying tiny surf boards, digital art",
    "3D render of a cute tropical fish in an aquarium on a dark blue background, digital art",
    "an astronaut lounging in a tropical resort in space, vaporwave",
    "an oil painting portrait of a capybara wearing medieval royal robes and an ornate crown on a dark background",
    "a stained glass window depicting a hamburger and french fries",
    "a pencil and watercolor drawing of a bright city in the future with flying cars",
    "a sunlit indoor lounge area with a pool with clear water and another pool with translucent pastel pink water, next to a big window, digital art",
    "a fortune-telling shiba inu reading your fate in a giant hamburger, digital art",
    "a crowded city fountain surrounded by pigeons, in the style of a vintage travel poster",
    "A hand-drawn sailboat circled by birds on the sea at sunrise",
    "A plush toy robot sitting against a yellow wall",
    "A Samurai riding a Horse on Mars, lomography.",
    "A Space Shuttle flying above Cape Town, digital art",
    "a sea otter with a pearl earring by Johannes Vermeer",
    "An Impressionist oil painting of sunflowers in a purple vase",
];

/// Supplies a replacement prompt for the "surprise me" action.
pub trait PromptSource: Send + Sync {
    fn next_prompt(&self, current: &str) -> String;
}

/// Picks uniformly from a fixed deck, never repeating the current prompt while
/// the deck has an alternative.
#[derive(Debug, Clone)]
pub struct SurprisePrompts {
    prompts: Vec<String>,
}

impl Default for SurprisePrompts {
    fn default() -> Self {
        Self::new(SURPRISE_ME_PROMPTS.iter().map(|prompt| (*prompt).to_string()))
    }
}

impl SurprisePrompts {
    pub fn new(prompts: impl IntoIterator<Item = String>) -> Self {
        Self {
            prompts: prompts
                .into_iter()
                .filter(|prompt| !prompt.trim().is_empty())
                .collect(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl PromptSource for SurprisePrompts {
    fn next_prompt(&self, current: &str) -> String {
        let candidates = self
            .prompts
            .iter()
            .filter(|prompt| prompt.as_str() != current)
            .collect::<Vec<&String>>();
        if candidates.is_empty() {
            return self
                .prompts
                .first()
                .cloned()
                .unwrap_or_else(|| current.to_string());
        }
        let idx = rand::rng().random_range(0..candidates.len());
        candidates[idx].clone()
    }
}
