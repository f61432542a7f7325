//! Question set loading and validation.

use log::info;
use rand::seq::SliceRandom;
use shared::Question;
use std::error::Error;
use std::fs;
use std::path::Path;

fn q(text: &str, options: [&str; 4], correct_option: u8) -> Question {
    Question {
        text: text.to_string(),
        options: options.map(|o| o.to_string()),
        correct_option,
    }
}

/// Built-in question set, used when no question file is given.
pub fn default_questions() -> Vec<Question> {
    vec![
        q(
            "Какой язык программирования используется?",
            ["Rust", "Python", "C++", "JavaScript"],
            1,
        ),
        q(
            "Столица Франции?",
            ["Берлин", "Париж", "Лондон", "Мадрид"],
            2,
        ),
        q("2 + 2 = ?", ["3", "4", "5", "6"], 2),
    ]
}

/// Loads questions from a JSON file: an array of objects with `text`,
/// `options` (exactly four strings) and `correct_option` (1..=4).
pub fn load_questions(path: &Path) -> Result<Vec<Question>, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let questions: Vec<Question> = serde_json::from_str(&data)?;
    validate(&questions)?;
    info!("Loaded {} questions from {}", questions.len(), path.display());
    Ok(questions)
}

/// Rejects question sets the server could not serve: empty sets, blank or
/// missing text, correct options outside 1..=4, and any `|` in text or
/// options (the wire format has no escaping, so it would corrupt the frame).
pub fn validate(questions: &[Question]) -> Result<(), Box<dyn Error>> {
    if questions.is_empty() {
        return Err("question set is empty".into());
    }
    for (index, question) in questions.iter().enumerate() {
        let number = index + 1;
        if question.text.trim().is_empty() {
            return Err(format!("question {}: text is empty", number).into());
        }
        if !(1..=4).contains(&question.correct_option) {
            return Err(format!(
                "question {}: correct_option {} is not in 1..=4",
                number, question.correct_option
            )
            .into());
        }
        if question.options.iter().any(|o| o.trim().is_empty()) {
            return Err(format!("question {}: an option is empty", number).into());
        }
        if question.text.contains('|') || question.options.iter().any(|o| o.contains('|')) {
            return Err(format!(
                "question {}: '|' is not allowed in question or option text",
                number
            )
            .into());
        }
    }
    Ok(())
}

/// Shuffles the question order in place.
pub fn shuffle_questions(questions: &mut [Question]) {
    questions.shuffle(&mut rand::thread_rng());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_questions_are_valid() {
        let questions = default_questions();
        assert!(!questions.is_empty());
        assert!(validate(&questions).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_set() {
        assert!(validate(&[]).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_correct_option() {
        let questions = vec![q("text", ["a", "b", "c", "d"], 5)];
        assert!(validate(&questions).is_err());

        let questions = vec![q("text", ["a", "b", "c", "d"], 0)];
        assert!(validate(&questions).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_text() {
        let questions = vec![q("   ", ["a", "b", "c", "d"], 1)];
        assert!(validate(&questions).is_err());

        let questions = vec![q("text", ["a", "", "c", "d"], 1)];
        assert!(validate(&questions).is_err());
    }

    #[test]
    fn test_validate_rejects_pipe_in_text() {
        let questions = vec![q("what|ever", ["a", "b", "c", "d"], 1)];
        assert!(validate(&questions).is_err());

        let questions = vec![q("text", ["a", "b|b", "c", "d"], 1)];
        assert!(validate(&questions).is_err());
    }

    #[test]
    fn test_shuffle_keeps_all_questions() {
        let mut questions = default_questions();
        let mut texts: Vec<String> = questions.iter().map(|q| q.text.clone()).collect();
        shuffle_questions(&mut questions);

        let mut shuffled: Vec<String> = questions.iter().map(|q| q.text.clone()).collect();
        texts.sort();
        shuffled.sort();
        assert_eq!(texts, shuffled);
    }

    #[test]
    fn test_questions_parse_from_json() {
        let json = r#"[
            {
                "text": "Столица Франции?",
                "options": ["Берлин", "Париж", "Лондон", "Мадрид"],
                "correct_option": 2
            }
        ]"#;
        let questions: Vec<Question> = serde_json::from_str(json).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options[1], "Париж");
        assert!(validate(&questions).is_ok());
    }

    #[test]
    fn test_json_with_wrong_option_count_fails_to_parse() {
        let json = r#"[{"text": "t", "options": ["a", "b", "c"], "correct_option": 1}]"#;
        let parsed: Result<Vec<Question>, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }
}
