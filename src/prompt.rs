//! Prompt assembly from fixed templates.
//!
//! The two templates are rendered through minijinja with lenient undefined
//! handling: a placeholder with no value disappears from the output instead
//! of surfacing as an error or a literal token.

use crate::persona::Persona;
use minijinja::{Environment, UndefinedBehavior, context};

const POST_TEMPLATE_NAME: &str = "post";
const REPLY_TEMPLATE_NAME: &str = "reply";

const POST_TEMPLATE: &str = "\
# Areas of Expertise
{{knowledge}}

# About {{agent_name}} (@{{handle}}):
{{bio}}
{{lore}}
{{topics}}

{{post_directions}}

# Task: Generate a post in the voice and style and perspective of {{agent_name}} @{{handle}}.
Write a 1-3 sentence post that is tech-savvy based on the latest trending news you read, here's what you read:

\"{{search_content}}\"

Here are the citations, where you read about this:
{{search_sources}}

You have to address what you read directly. Be brief, and concise, add a statement in your voice. The total character count MUST be less than 280. No emojis. Separate statements with double newlines.
";

const REPLY_TEMPLATE: &str = "\
# Areas of Expertise
{{knowledge}}

# About {{agent_name}} (@{{handle}}):
{{bio}}
{{lore}}
{{topics}}

{{post_directions}}

# Additional Behavior Guidelines:
- When presented with a choice or asked to decide between options, make a clear and decisive decision in line with {{agent_name}}'s persona and expertise.
- When asked for in-depth explanations, provide detailed and comprehensive responses that align with {{agent_name}}'s areas of expertise and knowledge.

# Task: Generate a post/reply in the voice, style and perspective of {{agent_name}} (@{{handle}}), using the thread of posts below as additional context:

Thread of posts you are replying to:
{{quote}}
";

/// The persona-derived placeholder values shared by both templates.
#[derive(Debug, Clone, Default)]
pub struct PromptState {
    pub agent_name: String,
    pub handle: String,
    pub knowledge: String,
    pub bio: String,
    pub lore: String,
    pub topics: String,
    pub post_directions: String,
}

/// Renders the fixed post and reply templates.
#[derive(Debug)]
pub struct PromptAssembler {
    env: Environment<'static>,
}

impl PromptAssembler {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.add_template(POST_TEMPLATE_NAME, POST_TEMPLATE)?;
        env.add_template(REPLY_TEMPLATE_NAME, REPLY_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the original-post prompt around retrieved trending content.
    pub fn render_post(
        &self,
        state: &PromptState,
        search_content: &str,
        search_sources: &str,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template(POST_TEMPLATE_NAME)?.render(context! {
            agent_name => state.agent_name,
            handle => state.handle,
            knowledge => state.knowledge,
            bio => state.bio,
            lore => state.lore,
            topics => state.topics,
            post_directions => state.post_directions,
            search_content => search_content,
            search_sources => search_sources,
        })
    }

    /// Render the reply prompt around a quoted thread.
    pub fn render_reply(
        &self,
        state: &PromptState,
        quote: &str,
    ) -> Result<String, minijinja::Error> {
        self.env.get_template(REPLY_TEMPLATE_NAME)?.render(context! {
            agent_name => state.agent_name,
            handle => state.handle,
            knowledge => state.knowledge,
            bio => state.bio,
            lore => state.lore,
            topics => state.topics,
            post_directions => state.post_directions,
            quote => quote,
        })
    }
}

/// Merge the persona's "all" and "post" style lines under a header.
/// An empty merge yields an empty section with no header.
pub fn post_directions(persona: &Persona) -> String {
    let lines: Vec<&str> = persona
        .style
        .get("all")
        .into_iter()
        .chain(persona.style.get("post"))
        .flatten()
        .map(String::as_str)
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "# Post Directions for {}\n{}\n",
        persona.name,
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PromptState {
        PromptState {
            agent_name: "daige".into(),
            handle: "daige_ai".into(),
            knowledge: "k1\nk2".into(),
            bio: "a bio".into(),
            lore: "some lore".into(),
            topics: "daige is interested in ai and mev".into(),
            post_directions: "# Post Directions for daige\nbe brief\n".into(),
        }
    }

    #[test]
    fn post_prompt_embeds_search_content_and_sources() {
        let assembler = PromptAssembler::new().expect("templates should compile");
        let prompt = assembler
            .render_post(&state(), "big model news", "https://example.com/a")
            .expect("render should succeed");

        assert!(prompt.contains("\"big model news\""));
        assert!(prompt.contains("https://example.com/a"));
        assert!(prompt.contains("@daige_ai"));
        assert!(prompt.contains("less than 280"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn reply_prompt_embeds_the_quoted_thread() {
        let assembler = PromptAssembler::new().expect("templates should compile");
        let prompt = assembler
            .render_reply(&state(), "someone said a thing")
            .expect("render should succeed");

        assert!(prompt.contains("someone said a thing"));
        assert!(prompt.contains("decisive"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn empty_placeholder_values_render_as_empty() {
        let assembler = PromptAssembler::new().expect("templates should compile");
        let prompt = assembler
            .render_post(&PromptState::default(), "", "")
            .expect("render should succeed");

        // No literal markers survive, the template skeleton does.
        assert!(!prompt.contains("{{"));
        assert!(prompt.contains("# Areas of Expertise"));
    }

    #[test]
    fn post_directions_omit_the_header_when_style_is_empty() {
        let raw = serde_json::json!({
            "name": "daige",
            "settings": {"model": "gpt-4o"},
            "system": "You are daige.",
            "bio": ["b"],
            "lore": ["l"],
            "adjectives": ["terse"],
            "topics": ["ai"],
            "style": {"chat": ["only chat lines"]},
            "knowledge": ["k"],
            "search_queries": {"ai": ["q"]},
        });
        let persona: Persona = serde_json::from_value(raw).expect("persona should deserialize");
        assert_eq!(post_directions(&persona), "");
    }

    #[test]
    fn post_directions_merge_all_and_post_lines() {
        let raw = serde_json::json!({
            "name": "daige",
            "settings": {"model": "gpt-4o"},
            "system": "You are daige.",
            "bio": ["b"],
            "lore": ["l"],
            "adjectives": ["terse"],
            "topics": ["ai"],
            "style": {"all": ["be brief"], "post": ["no hashtags"]},
            "knowledge": ["k"],
            "search_queries": {"ai": ["q"]},
        });
        let persona: Persona = serde_json::from_value(raw).expect("persona should deserialize");
        let directions = post_directions(&persona);
        assert!(directions.starts_with("# Post Directions for daige\n"));
        assert!(directions.contains("be brief\nno hashtags"));
    }
}
