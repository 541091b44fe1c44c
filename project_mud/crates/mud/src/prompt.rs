//! Character creation as a sub-state machine. The worker feeds it one line
//! at a time while it is active; `exit` abandons it and `back` steps to
//! the previous field.

use net::Packet;
use player_db::{PlayerCharacter, Sex};

pub const WELCOME: &str = "Welcome to the character creation prompt. You can return to a previous field with the 'back' command. You can exit this prompt at any time by typing 'exit'.";
pub const EXITED: &str = "Exiting character creation prompt. Character was not created.";
pub const RETURNING: &str = "Returning to previous prompt field. Use the 'back' command to back up further to make more changes.";
pub const YES_OR_NO: &str = "Please enter 'yes' or 'no'.";
pub const NAME_TAKEN: &str = "That character name is taken.";

const MAX_DESCRIPTION: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Race,
    Sex,
    Class,
    Description,
    Confirm,
}

impl Field {
    fn question(self) -> &'static str {
        match self {
            Self::Name => "<< Please enter your desired character name. >>",
            Self::Race => "<< What is your character's race? (Human, Elf, Dwarf, Orc, etc) >>",
            Self::Sex => "<< Is your character male or female? >>",
            Self::Class => "<< Please enter your character's class. (Warrior, Wizard, Paladin, Thief, etc) >>",
            Self::Description => "<< Please enter a short description of your character. Your description should complete this sentence: 'Your character looks [description].' This description can be changed later. >>",
            Self::Confirm => "",
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Name | Self::Race => Self::Name,
            Self::Sex => Self::Race,
            Self::Class => Self::Sex,
            Self::Description => Self::Class,
            Self::Confirm => Self::Description,
        }
    }
}

/// What the session should do after a line was fed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptStep {
    /// Still collecting; send these packets and keep the prompt.
    Continue(Vec<Packet>),
    /// The user typed `exit`.
    Cancelled(Packet),
    /// Confirmed. The caller stores and saves the character.
    Created(PlayerCharacter),
}

#[derive(Debug, Clone)]
pub struct CreateCharacterPrompt {
    field: Field,
    name: String,
    race: String,
    sex: Sex,
    class: String,
    description: String,
}

impl CreateCharacterPrompt {
    /// A fresh prompt and the packets that open it.
    pub fn start() -> (Self, Vec<Packet>) {
        let prompt = Self {
            field: Field::Name,
            name: String::new(),
            race: String::new(),
            sex: Sex::Male,
            class: String::new(),
            description: String::new(),
        };
        let packets = vec![Packet::prompt(WELCOME), Packet::prompt(Field::Name.question())];
        (prompt, packets)
    }

    /// If `input` would be accepted as the character name apart from the
    /// uniqueness check, the name to look up.
    pub fn pending_name_check(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if self.field != Field::Name || is_control(input) {
            return None;
        }
        validate_word(input, NAME_RULES).ok()?;
        Some(input.to_string())
    }

    /// Advance with one line. `name_taken` is only consulted on the name
    /// field.
    pub fn feed(&mut self, input: &str, name_taken: bool) -> PromptStep {
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            return PromptStep::Cancelled(Packet::text(EXITED));
        }
        if input.eq_ignore_ascii_case("back") {
            self.field = self.field.previous();
            return PromptStep::Continue(vec![self.question()]);
        }

        match self.field {
            Field::Name => {
                let checked = validate_word(input, NAME_RULES).and_then(|()| {
                    if name_taken {
                        Err(NAME_TAKEN)
                    } else {
                        Ok(())
                    }
                });
                self.accept(checked, |p| p.name = input.to_string())
            }
            Field::Race => self.accept(validate_word(input, RACE_RULES), |p| {
                p.race = input.to_string()
            }),
            Field::Sex => {
                let parsed = if input.is_empty() {
                    Err("Character sex can not be empty.")
                } else {
                    Sex::parse(input).ok_or("Character sex must be 'male' or 'female'.")
                };
                match parsed {
                    Ok(sex) => self.accept(Ok(()), |p| p.sex = sex),
                    Err(msg) => self.reject(msg),
                }
            }
            Field::Class => self.accept(validate_word(input, CLASS_RULES), |p| {
                p.class = input.to_string()
            }),
            Field::Description => {
                let checked = if input.chars().count() > MAX_DESCRIPTION {
                    Err("Character descriptions can not be longer than 200 letters.")
                } else {
                    Ok(())
                };
                self.accept(checked, |p| p.description = input.to_string())
            }
            Field::Confirm => {
                if input.eq_ignore_ascii_case("yes") {
                    PromptStep::Created(self.build())
                } else if input.eq_ignore_ascii_case("no") {
                    self.field = Field::Description;
                    PromptStep::Continue(vec![Packet::text(RETURNING), self.question()])
                } else {
                    PromptStep::Continue(vec![Packet::text(YES_OR_NO)])
                }
            }
        }
    }

    fn accept(
        &mut self,
        checked: Result<(), &'static str>,
        store: impl FnOnce(&mut Self),
    ) -> PromptStep {
        match checked {
            Ok(()) => {
                store(self);
                self.field = match self.field {
                    Field::Name => Field::Race,
                    Field::Race => Field::Sex,
                    Field::Sex => Field::Class,
                    Field::Class => Field::Description,
                    Field::Description | Field::Confirm => Field::Confirm,
                };
                PromptStep::Continue(vec![self.question()])
            }
            Err(msg) => self.reject(msg),
        }
    }

    fn reject(&self, msg: &'static str) -> PromptStep {
        PromptStep::Continue(vec![Packet::text(msg), self.question()])
    }

    fn question(&self) -> Packet {
        match self.field {
            Field::Confirm => Packet::prompt(format!(
                "Creating:\n    {}\nis this correct (yes/no)?",
                self.build().describe()
            )),
            field => Packet::prompt(field.question()),
        }
    }

    fn build(&self) -> PlayerCharacter {
        PlayerCharacter::new(
            self.name.clone(),
            self.race.clone(),
            self.sex,
            self.class.clone(),
            self.description.clone(),
        )
    }
}

fn is_control(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("back")
}

/// Error texts for a letters-only field, in check order.
struct WordRules {
    empty: &'static str,
    letters: &'static str,
    length: &'static str,
}

const NAME_RULES: WordRules = WordRules {
    empty: "Character name can not be empty.",
    letters: "Character names must contain only letters.",
    length: "Character names must between 3 and 20 letters long.",
};

const RACE_RULES: WordRules = WordRules {
    empty: "Character race can not be empty.",
    letters: "Character races must contain only letters.",
    length: "Character races must between 3 and 20 letters long.",
};

const CLASS_RULES: WordRules = WordRules {
    empty: "Character class can not be empty.",
    letters: "Character classes must contain only letters.",
    length: "Character classes can not be longer than 20 letters.",
};

fn validate_word(input: &str, rules: WordRules) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err(rules.empty);
    }
    if !input.chars().all(|c| c.is_ascii_alphabetic() || c == ' ') {
        return Err(rules.letters);
    }
    if !(3..=20).contains(&input.chars().count()) {
        return Err(rules.length);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use net::Directive;

    fn messages(step: &PromptStep) -> Vec<&str> {
        match step {
            PromptStep::Continue(packets) => packets.iter().map(|p| p.message.as_str()).collect(),
            PromptStep::Cancelled(p) => vec![p.message.as_str()],
            PromptStep::Created(_) => vec![],
        }
    }

    fn filled() -> CreateCharacterPrompt {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        prompt.feed("Aria", false);
        prompt.feed("Elf", false);
        prompt.feed("female", false);
        prompt.feed("Wizard", false);
        prompt.feed("tall and wise", false);
        prompt
    }

    #[test]
    fn start_sends_welcome_and_name_question() {
        let (_, packets) = CreateCharacterPrompt::start();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].message, WELCOME);
        assert!(packets.iter().all(|p| p.directive == Directive::Prompt));
        assert_eq!(packets[1].message, "<< Please enter your desired character name. >>");
    }

    #[test]
    fn full_walkthrough_creates_character() {
        let mut prompt = filled();
        assert_eq!(prompt.field, Field::Confirm);
        let pc = match prompt.feed("yes", false) {
            PromptStep::Created(pc) => pc,
            other => panic!("expected a character, got {other:?}"),
        };
        assert_eq!(pc.describe(), "Aria is a level 1 Elf Wizard. She looks tall and wise.");
    }

    #[test]
    fn confirm_shows_summary() {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        for line in ["Aria", "Elf", "female", "Wizard"] {
            prompt.feed(line, false);
        }
        let step = prompt.feed("tall and wise", false);
        assert_eq!(
            messages(&step),
            vec!["Creating:\n    Aria is a level 1 Elf Wizard. She looks tall and wise.\nis this correct (yes/no)?"]
        );
    }

    #[test]
    fn first_failing_rule_wins() {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        assert_eq!(messages(&prompt.feed("", false))[0], "Character name can not be empty.");
        assert_eq!(
            messages(&prompt.feed("R2", false))[0],
            "Character names must contain only letters."
        );
        assert_eq!(
            messages(&prompt.feed("Al", false))[0],
            "Character names must between 3 and 20 letters long."
        );
        assert_eq!(messages(&prompt.feed("Alan", true))[0], NAME_TAKEN);
        assert_eq!(prompt.field, Field::Name);
    }

    #[test]
    fn class_length_message_differs_from_race() {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        prompt.feed("Aria", false);
        assert_eq!(
            messages(&prompt.feed("Ab", false))[0],
            "Character races must between 3 and 20 letters long."
        );
        prompt.feed("Elf", false);
        assert_eq!(
            messages(&prompt.feed("robot", false))[0],
            "Character sex must be 'male' or 'female'."
        );
        prompt.feed("MALE", false);
        assert_eq!(
            messages(&prompt.feed("Ab", false))[0],
            "Character classes can not be longer than 20 letters."
        );
    }

    #[test]
    fn long_description_rejected() {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        for line in ["Aria", "Elf", "female", "Wizard"] {
            prompt.feed(line, false);
        }
        let long = "a".repeat(201);
        assert_eq!(
            messages(&prompt.feed(&long, false))[0],
            "Character descriptions can not be longer than 200 letters."
        );
        assert_eq!(prompt.field, Field::Description);
    }

    #[test]
    fn back_steps_to_previous_field() {
        let (mut prompt, _) = CreateCharacterPrompt::start();
        prompt.feed("Aria", false);
        prompt.feed("Elf", false);
        assert_eq!(prompt.field, Field::Sex);
        prompt.feed("BACK", false);
        assert_eq!(prompt.field, Field::Race);
        prompt.feed("back", false);
        prompt.feed("back", false);
        assert_eq!(prompt.field, Field::Name);
    }

    #[test]
    fn no_returns_to_description() {
        let mut prompt = filled();
        let step = prompt.feed("no", false);
        assert_eq!(messages(&step)[0], RETURNING);
        assert_eq!(prompt.field, Field::Description);
    }

    #[test]
    fn confirm_wants_yes_or_no() {
        let mut prompt = filled();
        assert_eq!(messages(&prompt.feed("maybe", false)), vec![YES_OR_NO]);
        assert_eq!(prompt.field, Field::Confirm);
    }

    #[test]
    fn exit_cancels_from_any_field() {
        let mut prompt = filled();
        let step = prompt.feed("exit", false);
        assert_eq!(step, PromptStep::Cancelled(Packet::text(EXITED)));
    }

    #[test]
    fn name_check_only_for_plausible_names() {
        let (prompt, _) = CreateCharacterPrompt::start();
        assert_eq!(prompt.pending_name_check(" Aria "), Some("Aria".to_string()));
        assert_eq!(prompt.pending_name_check("x"), None);
        assert_eq!(prompt.pending_name_check("exit"), None);
        assert_eq!(filled().pending_name_check("Aria"), None);
    }
}
