use futures_util::future::BoxFuture;
use net::Packet;
use player_db::PlayerDbError;
use session::{SessionError, SessionState};
use space::CharacterPresence;

use crate::commands::{base, welcome};
use crate::context::Session;
use crate::error::CommandError;
use crate::prompt::{CreateCharacterPrompt, PromptStep, NAME_TAKEN};
use crate::registry::{Arity, Command, CommandRegistry};

pub const WELCOME: &str = "Welcome to the account lobby! From here you can create, view, and play characters. Type 'help' to view a list of commands.";

pub const NO_SUCH_CHARACTER: &str = "You do not have a character with that name.";
pub const CHARACTER_IN_WORLD: &str = "That character is already in the world.";
pub const NOWHERE_TO_PLAY: &str = "There is no room to enter the world in.";

pub fn registry() -> CommandRegistry<Session> {
    base::registry()
        .with(base::logout_command())
        .with(Command::new(
            "characters",
            "View a listing of your characters.",
            "Proper usage is 'characters'.",
            Arity::None,
            characters,
        ))
        .with(Command::new(
            "create",
            "Create a new character.",
            "Proper usage is 'create'.",
            Arity::None,
            create,
        ))
        .with(Command::new(
            "play",
            "Play a character.",
            "You must specify a character to play. Proper usage is 'play [character name]'.",
            Arity::Args,
            play,
        ))
}

fn characters<'a>(
    s: &'a mut Session,
    _args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let listing = match s.account.as_ref().filter(|a| a.has_characters()) {
            None => "You have no characters.".to_string(),
            Some(account) => {
                let mut text = String::from("Your characters are: ");
                for pc in account.characters() {
                    text.push_str("\n    ");
                    text.push_str(&pc.describe());
                }
                text
            }
        };
        s.send_text(listing)
    })
}

fn create<'a>(
    s: &'a mut Session,
    _args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let (prompt, packets) = CreateCharacterPrompt::start();
        s.prompt = Some(prompt);
        for packet in packets {
            s.send(packet)?;
        }
        Ok(())
    })
}

fn play<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let wanted = args.ok_or(CommandError::Usage)?;
        let Some(pc) = s.account.as_ref().and_then(|a| a.character(wanted)).cloned() else {
            return s.send_text(NO_SUCH_CHARACTER);
        };
        let name = pc.name().to_string();

        let game = s.game.clone();
        let mut world = game.world.write().await;

        let room_key = pc
            .last_room
            .as_deref()
            .filter(|room| world.room_exists(room))
            .map(str::to_lowercase)
            .or_else(|| world.starting_room().map(|r| r.key()));
        let Some(room_key) = room_key else {
            tracing::warn!(session_id = ?s.id, character = %name, "World has no starting room");
            return s.send_text(NOWHERE_TO_PLAY);
        };

        match game.sessions.write().await.claim_character(s.id, &name) {
            Ok(()) => {}
            Err(SessionError::CharacterInUse(_)) => return s.send_text(CHARACTER_IN_WORLD),
            Err(e) => {
                tracing::warn!(session_id = ?s.id, error = %e, "Character claim failed");
                return Ok(());
            }
        }

        let presence = CharacterPresence::new(name.clone(), pc.describe(), s.id);
        if let Err(e) = world.enter(presence, &room_key) {
            tracing::warn!(
                session_id = ?s.id,
                character = %name,
                error = %e,
                "Could not place character"
            );
            game.sessions.write().await.release_character(s.id);
            return s.send_text(NOWHERE_TO_PLAY);
        }

        s.character = Some(name.clone());
        s.enter(SessionState::Playing);

        let Some(room) = world.get_room(&room_key) else {
            return Ok(());
        };
        game.router
            .broadcast_room(
                room.occupant_sessions(),
                s.id,
                Packet::text(format!("{name} has appeared.")),
            )
            .await;
        tracing::info!(
            session_id = ?s.id,
            character = %name,
            room = %room.name,
            "Entered the world"
        );

        s.send_text(welcome(SessionState::Playing))?;
        s.send_text(format!("You have entered {}.", room.name))?;
        s.send_text(room.describe(&name))
    })
}

/// Feed one line to the active character-creation prompt.
pub async fn continue_creation(s: &mut Session, line: &str) -> Result<(), CommandError> {
    let Some(mut prompt) = s.prompt.take() else {
        return Ok(());
    };

    let taken = match prompt.pending_name_check(line) {
        Some(candidate) => {
            match s.gateway(move |gw| gw.character_name_taken(&candidate)).await {
                Ok(taken) => taken,
                Err(e) => {
                    tracing::warn!(session_id = ?s.id, error = %e, "Name check failed");
                    true
                }
            }
        }
        None => false,
    };

    match prompt.feed(line, taken) {
        PromptStep::Continue(packets) => {
            s.prompt = Some(prompt);
            for packet in packets {
                s.send(packet)?;
            }
            Ok(())
        }
        PromptStep::Cancelled(packet) => s.send(packet),
        PromptStep::Created(pc) => {
            let name = pc.name().to_string();
            let Some(account) = s.account.as_mut() else {
                return Ok(());
            };
            account.add_character(pc);
            let snapshot = account.clone();
            match s.gateway(move |gw| gw.save(&snapshot)).await {
                Ok(()) => {
                    tracing::info!(session_id = ?s.id, character = %name, "Character created");
                    s.send_text(format!("{name} was created successfully."))
                }
                Err(e) => {
                    if let Some(account) = s.account.as_mut() {
                        account.remove_character(&name);
                    }
                    if matches!(e, CommandError::Gateway(PlayerDbError::CharacterNameTaken(_))) {
                        s.send_text(NAME_TAKEN)
                    } else {
                        tracing::error!(
                            session_id = ?s.id,
                            character = %name,
                            error = %e,
                            "Character save failed"
                        );
                        s.send_text(format!("{name} could not be saved."))
                    }
                }
            }
        }
    }
}
