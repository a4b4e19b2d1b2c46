//! First-person → second/third-person restatement transform.
//!
//! [`restate`] takes a first-person statement and produces the two stored
//! grammatical forms:
//!
//! - **local form** — second person, for conversational retrieval
//!   ("I love hiking" → "you love hiking")
//! - **graph form** — third person with the subject's name substituted for
//!   "I", verbs conjugated to third-person singular
//!   ("I love hiking" → "Alice loves hiking")
//!
//! The transform is one-directional and deterministic. Input that contains no
//! first-person content passes through unchanged in both forms — that is a
//! no-op, not an error. Re-applying the transform to already-restated text is
//! undefined and deliberately unsupported.

/// A token stream piece: either a word or the separator text between words.
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Word(String),
    Sep(String),
}

/// Modal auxiliaries — the verb they govern stays in base form.
const MODALS: &[&str] = &[
    "will", "would", "can", "could", "may", "might", "must", "shall", "should",
];

/// Coordinating conjunctions directly after "I" mark a compound subject.
const CONJUNCTIONS: &[&str] = &["and", "or", "nor"];

/// Adverbs that commonly sit between "I" and the governed verb.
const ADVERBS: &[&str] = &[
    "really", "also", "always", "never", "often", "usually", "just", "still",
    "sometimes", "rarely", "truly", "definitely", "probably",
];

/// Irregular present-tense third-person-singular forms.
const IRREGULAR_PRESENT: &[(&str, &str)] = &[
    ("am", "is"),
    ("have", "has"),
    ("do", "does"),
    ("go", "goes"),
];

/// Common irregular past-tense forms — left unchanged by conjugation.
const IRREGULAR_PAST: &[&str] = &[
    "did", "was", "were", "went", "had", "said", "made", "got", "took", "saw",
    "came", "knew", "thought", "found", "gave", "told", "became", "left",
    "felt", "put", "brought", "began", "kept", "held", "wrote", "stood",
    "heard", "let", "meant", "set", "met", "ran", "paid", "sat", "spoke",
    "led", "grew", "lost", "fell", "sent", "built", "understood", "drew",
    "broke", "spent", "cut", "rose", "drove", "bought", "wore", "chose",
    "ate", "slept", "taught", "won", "quit", "hit", "hurt",
];

/// Negated auxiliary contractions expanded when directly governed by "I".
const NEGATED_AUX: &[(&str, &str)] = &[
    ("don't", "do not"),
    ("didn't", "did not"),
    ("can't", "cannot"),
    ("won't", "will not"),
    ("haven't", "have not"),
    ("wouldn't", "would not"),
    ("couldn't", "could not"),
    ("shouldn't", "should not"),
];

/// Produce `(local_form, graph_form)` for a first-person statement.
///
/// If the text contains no first-person token at all, both outputs equal the
/// input verbatim.
pub fn restate(raw_text: &str, subject_name: &str) -> (String, String) {
    let pieces = split_pieces(raw_text);

    if !pieces.iter().any(|p| match p {
        Piece::Word(w) => is_first_person(w),
        Piece::Sep(_) => false,
    }) {
        return (raw_text.to_string(), raw_text.to_string());
    }

    let expanded = expand_contractions(pieces);
    let local = local_form(&expanded);
    let graph = graph_form(&expanded, subject_name);
    (local, graph)
}

/// Split text into alternating word and separator pieces. Apostrophes are
/// part of words so contractions stay intact.
fn split_pieces(text: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    for c in text.chars() {
        let word_char = c.is_alphanumeric() || c == '\'';
        if word_char != in_word && !current.is_empty() {
            pieces.push(if in_word {
                Piece::Word(std::mem::take(&mut current))
            } else {
                Piece::Sep(std::mem::take(&mut current))
            });
        }
        in_word = word_char;
        current.push(c);
    }
    if !current.is_empty() {
        pieces.push(if in_word {
            Piece::Word(current)
        } else {
            Piece::Sep(current)
        });
    }
    pieces
}

fn is_first_person(word: &str) -> bool {
    matches!(
        word.to_lowercase().as_str(),
        "i" | "i'm" | "i've" | "i'll" | "i'd" | "my" | "me" | "mine" | "myself"
    )
}

/// Expand first-person-governed contractions before any substitution.
///
/// "I'm" / "I've" / "I'll" / "I'd" expand to subject + auxiliary, and a
/// negated auxiliary directly after "I" ("I don't ...") expands so the
/// auxiliary is visible to conjugation.
fn expand_contractions(pieces: Vec<Piece>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::with_capacity(pieces.len());

    for piece in pieces {
        let Piece::Word(word) = piece else {
            out.push(piece);
            continue;
        };
        let lower = word.to_lowercase();

        let expansion = match lower.as_str() {
            "i'm" => Some("I am"),
            "i've" => Some("I have"),
            "i'll" => Some("I will"),
            "i'd" => Some("I would"),
            _ => None,
        };
        if let Some(expansion) = expansion {
            push_words(&mut out, expansion);
            continue;
        }

        // Negated auxiliary governed by a directly preceding "I"
        if previous_word_is_i(&out) {
            if let Some((_, full)) = NEGATED_AUX.iter().find(|(c, _)| *c == lower) {
                push_words(&mut out, full);
                continue;
            }
        }

        out.push(Piece::Word(word));
    }
    out
}

fn previous_word_is_i(pieces: &[Piece]) -> bool {
    pieces
        .iter()
        .rev()
        .find_map(|p| match p {
            Piece::Word(w) => Some(w.eq_ignore_ascii_case("i")),
            Piece::Sep(_) => None,
        })
        .unwrap_or(false)
}

fn push_words(out: &mut Vec<Piece>, words: &str) {
    for (i, w) in words.split(' ').enumerate() {
        if i > 0 {
            out.push(Piece::Sep(" ".to_string()));
        }
        out.push(Piece::Word(w.to_string()));
    }
}

/// Second-person form: swap pronouns, leave verbs alone (second-person verb
/// forms equal base form — except "am", the one copula that differs).
fn local_form(pieces: &[Piece]) -> String {
    let mut out = String::new();
    let mut prev_word_was_i = false;
    for piece in pieces {
        match piece {
            Piece::Sep(s) => out.push_str(s),
            Piece::Word(w) => {
                let lower = w.to_lowercase();
                let replacement = match lower.as_str() {
                    "i" => Some("you"),
                    "my" => Some("your"),
                    "me" => Some("you"),
                    "mine" => Some("yours"),
                    "myself" => Some("yourself"),
                    "am" if prev_word_was_i => Some("are"),
                    _ => None,
                };
                match replacement {
                    Some(r) => out.push_str(r),
                    None => out.push_str(w),
                }
                prev_word_was_i = lower == "i";
            }
        }
    }
    out
}

/// Third-person form: substitute the subject's name for first-person
/// pronouns and conjugate each verb governed by a substituted "I".
fn graph_form(pieces: &[Piece], name: &str) -> String {
    // Indices of word pieces, in order.
    let word_indices: Vec<usize> = pieces
        .iter()
        .enumerate()
        .filter_map(|(i, p)| matches!(p, Piece::Word(_)).then_some(i))
        .collect();

    // Word positions whose verb must be conjugated to third-person singular.
    let mut conjugate_at: Vec<usize> = Vec::new();
    for (wi, &pi) in word_indices.iter().enumerate() {
        let Piece::Word(w) = &pieces[pi] else { continue };
        if !w.eq_ignore_ascii_case("i") {
            continue;
        }
        if let Some(verb_pi) = governed_verb(pieces, &word_indices, wi) {
            conjugate_at.push(verb_pi);
        }
    }

    let mut out = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Sep(s) => out.push_str(s),
            Piece::Word(w) => {
                let lower = w.to_lowercase();
                match lower.as_str() {
                    "i" => out.push_str(name),
                    "my" => {
                        out.push_str(name);
                        out.push_str("'s");
                    }
                    "me" => out.push_str(name),
                    "mine" => {
                        out.push_str(name);
                        out.push_str("'s");
                    }
                    "myself" => {
                        out.push_str(name);
                        out.push_str("self");
                    }
                    _ if conjugate_at.contains(&i) => {
                        out.push_str(&conjugate_third_singular(&lower));
                    }
                    _ => out.push_str(w),
                }
            }
        }
    }
    out
}

/// Find the verb governed by the "I" at word position `subject_wi`, skipping
/// intervening adverbs. Returns `None` when there is no conjugatable verb:
/// nothing follows, the verb is governed by a modal, or it is past tense.
fn governed_verb(pieces: &[Piece], word_indices: &[usize], subject_wi: usize) -> Option<usize> {
    let mut wi = subject_wi + 1;
    while wi < word_indices.len() {
        let pi = word_indices[wi];
        let Piece::Word(w) = &pieces[pi] else { return None };
        let lower = w.to_lowercase();

        if ADVERBS.contains(&lower.as_str()) {
            wi += 1;
            continue;
        }
        if MODALS.contains(&lower.as_str()) {
            // Modal governs the verb — everything stays base form.
            return None;
        }
        if CONJUNCTIONS.contains(&lower.as_str()) {
            // Coordinate subject ("I and my brother ...") — the verb is
            // governed by the compound, not by "I" alone.
            return None;
        }
        if is_past_tense(&lower) {
            return None;
        }
        return Some(pi);
    }
    None
}

/// Present-tense verbs that happen to end in "ed".
const PRESENT_ED: &[&str] = &[
    "need", "feed", "shed", "wed", "embed", "speed", "bleed", "breed",
    "exceed", "proceed", "succeed",
];

fn is_past_tense(verb: &str) -> bool {
    IRREGULAR_PAST.contains(&verb)
        || (verb.len() > 3 && verb.ends_with("ed") && !PRESENT_ED.contains(&verb))
}

/// Conjugate a base-form verb to third-person singular.
fn conjugate_third_singular(verb: &str) -> String {
    if let Some((_, third)) = IRREGULAR_PRESENT.iter().find(|(base, _)| *base == verb) {
        return (*third).to_string();
    }

    let bytes = verb.as_bytes();
    if verb.ends_with('s')
        || verb.ends_with('x')
        || verb.ends_with('z')
        || verb.ends_with("ch")
        || verb.ends_with("sh")
    {
        return format!("{verb}es");
    }
    if verb.ends_with('y') && bytes.len() >= 2 {
        let before = bytes[bytes.len() - 2] as char;
        if !matches!(before, 'a' | 'e' | 'i' | 'o' | 'u') {
            return format!("{}ies", &verb[..verb.len() - 1]);
        }
    }
    format!("{verb}s")
}
