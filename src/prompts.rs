//! Prompt construction for the three generation stages.
//!
//! Unit tests inspect the prompts directly without a live model.
//!
//! All functions are pure: same request in, same text out.

use crate::request::{language_name, GenerationRequest};

/// Image style used for both covers in children's mode.
pub const CHILDREN_STYLE_PHRASE: &str = "children's book style, colourful, playful and friendly";

/// Opening section every children's book must have.
pub const CHILDREN_OPENING: &str = "Once upon a time...";

/// Closing section every children's book must have.
pub const CHILDREN_CLOSING: &str = "And they lived happily ever after.";

/// Default number of body characters handed to the back-cover prompt.
pub const DEFAULT_BACK_COVER_CONTEXT_CHARS: usize = 500;

/// Prompts known before any stage runs.
///
/// The back-cover prompt needs the generated text and is built later with
/// [`back_cover_prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompts {
    pub text: String,
    pub front_cover: String,
}

/// Build the text and front-cover prompts for a request.
pub fn build_prompts(request: &GenerationRequest) -> StagePrompts {
    StagePrompts {
        text: text_prompt(request),
        front_cover: front_cover_prompt(request),
    }
}

/// Style words for the cover images.
pub fn image_style_phrase(request: &GenerationRequest) -> String {
    if request.children_mode {
        CHILDREN_STYLE_PHRASE.to_string()
    } else {
        format!("{} style", request.cover_style.prompt_phrase())
    }
}

/// Instructions for the body text.
pub fn text_prompt(request: &GenerationRequest) -> String {
    if request.children_mode {
        children_text_prompt(request)
    } else {
        standard_text_prompt(request)
    }
}

fn theme_instruction(request: &GenerationRequest) -> String {
    match request.theme() {
        Some(theme) => format!(
            "**Additional Subject:** Weave the following subject cohesively throughout the eBook: \"{theme}\"."
        ),
        None => String::new(),
    }
}

fn children_text_prompt(request: &GenerationRequest) -> String {
    format!(
        r#"
You are a children's book author. Your task is to write a children's eBook about the topic: "{topic}".

**Instructions:**
1.  **Language:** Write the eBook entirely in {language}.
2.  **Audience:** The content must be suitable for children aged 5 to 8. Use simple words, short sentences and a playful, fun tone.
3.  **Structure:** Organise the eBook with the following structure, using Markdown formatting:
    -   A magical, captivating title on the first line (e.g. # The Amazing Journey of...).
    -   A "{opening}" section (Introduction).
    -   Exactly {chapters} short, engaging chapters, each with its own heading (e.g. ## Chapter 1: ...).
    -   An "{closing}" section (Conclusion with a positive lesson).
4.  **Quality:** The story must be creative, with interesting characters and a positive message. Avoid complex concepts.
5.  {theme}

Start writing the story directly, beginning with the title.
"#,
        topic = request.topic.trim(),
        language = language_name(&request.language),
        opening = CHILDREN_OPENING,
        chapters = request.chapters,
        closing = CHILDREN_CLOSING,
        theme = theme_instruction(request),
    )
}

fn standard_text_prompt(request: &GenerationRequest) -> String {
    format!(
        r#"
You are an expert author and researcher. Your task is to write a comprehensive eBook about the topic: "{topic}".

**Instructions:**
1.  **Language:** Write the eBook entirely in {language}.
2.  **Length:** The content must be substantial and well detailed.
3.  **Structure:** Organise the eBook with the following structure, using Markdown formatting:
    -   A clear, captivating title on the first line (e.g. # eBook Title).
    -   An "Introduction" section.
    -   Exactly {chapters} main chapters, each with a clear heading (e.g. ## Chapter 1: Chapter Title).
    -   A "Conclusion" section.
4.  **Quality:** The text must be informative, well written, engaging and accurate. Use Google Search to make sure the information is current and factual.
5.  **Tone:** Keep a {tone} tone.
6.  {theme}

Start writing the eBook directly, beginning with the title. Do not include the cover or any reference to it in the text.
"#,
        topic = request.topic.trim(),
        language = language_name(&request.language),
        chapters = request.chapters,
        tone = request.tone.prompt_phrase(),
        theme = theme_instruction(request),
    )
}

/// Instructions for the front-cover image.
pub fn front_cover_prompt(request: &GenerationRequest) -> String {
    format!(
        "Book cover in {style} for an eBook about \"{topic}\". The cover must be visually appealing, \
focused on a central character or scene, and must not contain any text.",
        style = image_style_phrase(request),
        topic = request.full_topic(),
    )
}

/// Instructions for the back-cover image.
///
/// `body` is the generated text; only its first `context_chars` characters
/// are included.
pub fn back_cover_prompt(request: &GenerationRequest, body: &str, context_chars: usize) -> String {
    format!(
        "Back cover in {style} for an eBook about \"{topic}\". The image must be visually interesting, \
related to the following content, but different from the front cover art. The image must not \
contain any text. Content summary: \"{summary}\"",
        style = image_style_phrase(request),
        topic = request.full_topic(),
        summary = leading_chars(body, context_chars),
    )
}

/// The first `n` characters of `s`, never splitting a code point.
pub fn leading_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
