//! Integration test: message tokenization properties

use disaster_triage::feature_engineering::{
    is_stop_word, MessageTokenizer, ENGLISH_STOP_WORDS, URL_PLACEHOLDER,
};

fn tokenizer() -> MessageTokenizer {
    MessageTokenizer::new()
}

#[test]
fn test_urls_are_replaced() {
    let messages = [
        "Donate at https://www.redcross.org/donate now",
        "see http://bit.ly/2xYz?a=1&b=2 for shelters",
        "two links http://a.com and https://b.org/path",
    ];

    for message in messages {
        let tokens = tokenizer().tokenize(message);
        assert!(tokens.iter().any(|t| t == URL_PLACEHOLDER), "{:?}", tokens);
        assert!(
            tokens.iter().all(|t| !t.contains("http") && !t.contains("www")),
            "url fragment survived in {:?}",
            tokens
        );
    }
}

#[test]
fn test_tokens_are_lowercase_alphanumeric() {
    let messages = [
        "URGENT!!! We NEED Water, Food & Medicine @ Camp #4",
        "Earthquake 7.0 hit Port-au-Prince; buildings collapsed...",
        "   tabs\tand\nnewlines   ",
        "Ça va? Non! Besoin d'eau.",
    ];

    for message in messages {
        for token in tokenizer().tokenize(message) {
            assert!(!token.is_empty());
            assert!(
                token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
                "bad token {:?} from {:?}",
                token,
                message
            );
        }
    }
}

#[test]
fn test_stopword_only_input_is_empty() {
    assert!(tokenizer().tokenize("the and of to in").is_empty());
    assert!(tokenizer().tokenize("I am what you are, aren't we?").is_empty());
    assert!(tokenizer().tokenize("").is_empty());
}

#[test]
fn test_full_stop_word_list_is_empty() {
    let message = ENGLISH_STOP_WORDS.join(" ");
    assert!(tokenizer().tokenize(&message).is_empty());
    assert!(tokenizer().tokenize(&message.to_uppercase()).is_empty());
}

#[test]
fn test_output_has_no_stopwords() {
    let tokens = tokenizer().tokenize("There is no water in the houses and the children are sick");
    assert!(tokens.iter().all(|t| !is_stop_word(t)));
    assert!(tokens.contains(&"water".to_string()));
    assert!(tokens.contains(&"house".to_string()));
    assert!(tokens.contains(&"child".to_string()));
}
