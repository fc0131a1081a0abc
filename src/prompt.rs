//! Prompt assembly
//!
//! Every user turn is wrapped in a fixed instruction template that embeds
//! the recent conversation window, the full memory catalog, the session
//! clock, and the reply-format rules the interpretation pipeline relies
//! on. Summarization and memory-refinement calls bypass the template.

use crate::session::Session;

/// Reply-format rules the model is asked to follow
///
/// The interpretation pipeline extracts at most one fenced block per
/// reply and treats a recognized first-line language tag as a label, so
/// the rules here and `interpret::LANGUAGE_TAGS` must stay in step.
const FORMAT_RULES: &str = "\
You are an assistant with access to system command execution and web \
lookups. Your replies are parsed and may be acted on directly, so follow \
these rules exactly:

- To run something on the user's machine, emit exactly ONE fenced block. \
Open the fence with three backticks, put the language tag on the first \
line (`bash` for Linux, `cmd` for Windows, `code` for generated code), \
then the commands, then close the fence. Never emit more than one fenced \
block per reply.
- Several commands belong in the one block, separated by semicolons.
- When the user asks you to search for something, reply with a direct \
search URL of the form https://www.google.com/search?q=your+query and no \
further explanation. Any URL in your reply will be fetched and summarized \
aloud.
- Keep prose outside fences short; it is spoken to the user.";

/// Assemble the full templated prompt for one user turn
#[must_use]
pub fn assemble(session: &Session, history_window: &str, memory: &str, task: &str) -> String {
    format!(
        "{rules}\n\n\
         Current date: {date}\nCurrent time: {time}\n\n\
         <conversation-history>\n{history}\n</conversation-history>\n\n\
         Catalog of past successful interactions, available for recall:\n\
         <memory-catalog>\n{memory}\n</memory-catalog>\n\n\
         User Task: {task}",
        rules = FORMAT_RULES,
        date = session.current_date(),
        time = session.current_time(),
        history = history_window,
        memory = memory,
        task = task,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_config;

    #[test]
    fn template_embeds_all_sections() {
        let dir = std::env::temp_dir();
        let session = Session::new("llama3".to_string(), test_config(&dir));

        let prompt = assemble(&session, "user: hello", "remembers the printer fix", "ping the router");

        assert!(prompt.contains("<conversation-history>\nuser: hello\n</conversation-history>"));
        assert!(prompt.contains("<memory-catalog>\nremembers the printer fix\n</memory-catalog>"));
        assert!(prompt.contains("User Task: ping the router"));
        assert!(prompt.contains("Current date:"));
    }

    #[test]
    fn template_states_the_fence_rules() {
        let dir = std::env::temp_dir();
        let session = Session::new("llama3".to_string(), test_config(&dir));
        let prompt = assemble(&session, "", "", "anything");
        assert!(prompt.contains("exactly ONE fenced block"));
        assert!(prompt.contains("google.com/search?q="));
    }
}
