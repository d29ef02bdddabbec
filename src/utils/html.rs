// src/utils/html.rs

/// Sanitizes author-supplied rich text (quiz instructions) with ammonia.
///
/// Formatting tags such as <b> or <p> survive; <script>, <iframe> and event
/// handler attributes are stripped together with their content. Students see
/// this text rendered as HTML, so it must never be stored unsanitized.
pub fn clean_instructions(input: &str) -> String {
    ammonia::clean(input)
}
