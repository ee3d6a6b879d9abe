//! Prompt templates and context packing.
//!
//! Retrieved passages are packed into windows that fit the context budget.
//! The first window is answered with the question-answer template; every
//! further window refines the running answer.

const SEPARATOR: &str = "---------------------";

/// System prompt sent with every generation request.
pub fn system_prompt() -> &'static str {
    "You are a study assistant answering questions from a student's course notes.\n\
     Answer directly and concisely using only the notes you are given.\n\
     Do not mention the notes, passages or context in your answer.\n\
     If the notes do not contain the answer, say that you could not find it in the notes."
}

/// Prompt answering `question` from a first context window.
pub fn question_answer(context: &str, question: &str) -> String {
    format!(
        "Context information from the course notes is below.\n\
         {SEPARATOR}\n\
         {context}\n\
         {SEPARATOR}\n\
         Given the context information and not prior knowledge, answer the question.\n\
         Question: {question}\n\
         Answer: "
    )
}

/// Prompt refining `existing` with an additional context window.
pub fn refine(context: &str, question: &str, existing: &str) -> String {
    format!(
        "The original question is as follows: {question}\n\
         We have provided an existing answer: {existing}\n\
         We have the opportunity to refine the existing answer (only if needed) with some more context below.\n\
         {SEPARATOR}\n\
         {context}\n\
         {SEPARATOR}\n\
         Given the new context, refine the original answer to better answer the question. \
         If the context isn't useful, return the original answer.\n\
         Refined Answer: "
    )
}

/// Pack passages, in order, into windows of at most `max_chars` characters.
///
/// Passages are joined with a blank line. A passage longer than the budget
/// is truncated to fit a window of its own.
pub fn pack_context<'a, I>(passages: I, max_chars: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max_chars = max_chars.max(1);
    let mut windows = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for passage in passages {
        let passage = truncate_chars(passage.trim(), max_chars);
        let len = passage.chars().count();
        if len == 0 {
            continue;
        }

        let joined = if current.is_empty() { len } else { current_chars + 2 + len };
        if joined > max_chars && !current.is_empty() {
            windows.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
            current_chars += 2;
        }
        current.push_str(passage);
        current_chars += len;
    }

    if !current.is_empty() {
        windows.push(current);
    }

    windows
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
