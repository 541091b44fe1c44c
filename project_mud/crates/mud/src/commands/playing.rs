use futures_util::future::BoxFuture;
use net::Packet;
use rand::seq::SliceRandom;
use space::room::LOOK_FAILED;
use space::{Conversant, MoveOutcome, Room, World};

use crate::commands::base;
use crate::context::Session;
use crate::error::CommandError;
use crate::registry::{Arity, Command, CommandRegistry};

pub const WELCOME: &str = "Your vision begins to fade to black and you feel like you're being sucked down a drain and torn into pieces at the same time. A roaring sound fills your ears and suddenly you feel a sense of weightlessness. Maybe you should ask for some 'help'.";

pub const TOUGH: &str = "You're looking pretty tough there.  Let me see those muscles!";

const MUSINGS: [&str; 7] = [
    "I wish I had a tar pit full of werewolves right now.",
    "I wonder how long I've been here.",
    "I knew I shouldn't have taken directions from those mudkips.",
    "I'm starting to get hungry. I wish I had some food left in my backpack.",
    "What was that?  It sounded like squealing.",
    "Why am I talking to myself? Get a grip on yourself!",
    "Sure could go for pint of mead right about now...",
];

pub fn registry() -> CommandRegistry<Session> {
    base::registry()
        .with(base::logout_command())
        .with(Command::new(
            "say",
            "Say something out loud.",
            "What do you want to say? Proper usage is 'say [message]'.",
            Arity::Args,
            say,
        ))
        .alias("/s", "say")
        .with(Command::new(
            "go",
            "Move you through an exit.",
            "Where do you want to go? Proper usage is 'go [exit]'.",
            Arity::Args,
            go,
        ))
        .alias("move", "go")
        .with(Command::new(
            "look",
            "Look closely at something.",
            "What do you want to look at? Proper usage is 'look [something]'.",
            Arity::Args,
            look,
        ))
        .alias("inspect", "look")
        .with(Command::new(
            "talk",
            "Talk to someone or something.",
            "Who or what do you want to talk to? Proper usage is 'talk [something]' or 'talk [something] [topic]'.",
            Arity::Args,
            talk,
        ))
        .with(Command::new(
            "...",
            "For when you want to look tough.",
            "...",
            Arity::None,
            look_tough,
        ))
}

fn current_room<'w>(world: &'w World, character: &str) -> Option<&'w Room> {
    world
        .character_room(character)
        .and_then(|key| world.get_room(key))
}

fn musing() -> &'static str {
    MUSINGS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(MUSINGS[0])
}

fn say<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let message = args.ok_or(CommandError::Usage)?;
        let Some(name) = s.character.clone() else {
            return Ok(());
        };
        let packet = Packet::chat(format!("{name} >> {message}"));
        {
            let world = s.game.world.read().await;
            if let Some(room) = current_room(&world, &name) {
                s.game
                    .router
                    .broadcast_room(room.occupant_sessions(), s.id, packet.clone())
                    .await;
            }
        }
        s.send(packet)
    })
}

fn go<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let exit = args.ok_or(CommandError::Usage)?;
        let Some(name) = s.character.clone() else {
            return Ok(());
        };

        // The write lock covers the move and both notices, so nobody sees
        // the character in two rooms or in neither.
        let mut world = s.game.world.write().await;
        let arrived = match world.traverse(&name, exit) {
            Ok(MoveOutcome::Moved { from, to }) => {
                if let Some(source) = world.get_room(&from) {
                    s.game
                        .router
                        .broadcast_room(
                            source.occupant_sessions(),
                            s.id,
                            Packet::text(format!("{name} has left.")),
                        )
                        .await;
                }
                match world.get_room(&to) {
                    Some(dest) => {
                        s.game
                            .router
                            .broadcast_room(
                                dest.occupant_sessions(),
                                s.id,
                                Packet::text(format!("{name} appears.")),
                            )
                            .await;
                        Some((dest.name.clone(), dest.describe(&name)))
                    }
                    None => None,
                }
            }
            Ok(MoveOutcome::Stayed { room }) => {
                let description = world.get_room(&room).map(|r| r.describe(&name));
                drop(world);
                return match description {
                    Some(text) => s.send_text(text),
                    None => Ok(()),
                };
            }
            Err(e) => {
                drop(world);
                return s.send_text(e.to_string());
            }
        };
        drop(world);

        let Some((room_name, description)) = arrived else {
            return Ok(());
        };
        s.send_text(format!("You have entered {room_name}."))?;
        s.send_text(description)?;
        s.record_room(&room_name).await;
        Ok(())
    })
}

fn look<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let Some(name) = s.character.clone() else {
            return Ok(());
        };
        let target = args.map(str::to_lowercase);

        if matches!(target.as_deref(), Some("self" | "me")) {
            let text = s
                .playing_character()
                .map(|pc| pc.describe_self())
                .unwrap_or_else(|| LOOK_FAILED.to_string());
            return s.send_text(text);
        }

        let text = {
            let world = s.game.world.read().await;
            match current_room(&world, &name) {
                None => LOOK_FAILED.to_string(),
                Some(room) => match target.as_deref() {
                    None | Some("room" | "around") => room.describe(&name),
                    Some(t) if t == room.key() => room.describe(&name),
                    Some(t) => room
                        .describe_object(t)
                        .unwrap_or_else(|| LOOK_FAILED.to_string()),
                },
            }
        };
        s.send_text(text)
    })
}

fn talk<'a>(s: &'a mut Session, args: Option<&'a str>) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move {
        let arg = args.ok_or(CommandError::Usage)?;
        let Some(name) = s.character.clone() else {
            return Ok(());
        };

        if matches!(
            arg.to_lowercase().as_str(),
            "self" | "yourself" | "myself" | "me"
        ) {
            return s.send_text(musing());
        }

        let (who, topic) = match arg.split_once(' ') {
            Some((who, topic)) => (who, topic.trim()),
            None => (arg, space::Conversation::DEFAULT_TOPIC),
        };

        let reply = {
            let world = s.game.world.read().await;
            current_room(&world, &name)
                .and_then(|room| room.actor(who))
                .map(|actor| actor.respond(topic).to_string())
        };
        match reply {
            Some(text) => s.send_text(text),
            None => s.send_text(format!("You can't find anyone named {who} to talk to.")),
        }
    })
}

fn look_tough<'a>(
    s: &'a mut Session,
    _args: Option<&'a str>,
) -> BoxFuture<'a, Result<(), CommandError>> {
    Box::pin(async move { s.send_text(TOUGH) })
}
