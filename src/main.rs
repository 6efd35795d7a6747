mod channel;
mod control;
mod core;
mod player;
mod session;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::control::NoSearch;
use crate::core::{AppConfig, LoopEdge, NUDGE_COARSE, NUDGE_FINE};
use crate::player::SimulatedProvider;
use crate::session::Session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AppConfig::load()?;
    let mut session = Session::launch(
        &config,
        Arc::new(SimulatedProvider::default()),
        Arc::new(NoSearch),
    )?;
    println!(
        "loopwall: {} slots up. Type 'help' for commands, 'quit' to exit.",
        session.slot_count()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(200));

    loop {
        tokio::select! {
            _ = ticker.tick() => session.controller.pump(),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                session.controller.pump();
                if !run_command(&mut session, line.trim()).await {
                    break;
                }
                if let Some(notice) = session.controller.take_notice() {
                    println!("! {}", notice);
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

/// Execute one console command. Returns false when the session should end.
async fn run_command(session: &mut Session, line: &str) -> bool {
    let controller = &mut session.controller;
    let mut parts = line.split_whitespace();
    let result = match (parts.next(), parts.next(), parts.next()) {
        (None, _, _) => Ok(()),
        (Some("quit"), _, _) | (Some("exit"), _, _) => return false,
        (Some("help"), _, _) => {
            print_help();
            Ok(())
        }
        (Some("status"), _, _) => {
            for slot in controller.slots() {
                let ls = slot.loop_settings();
                println!(
                    "[{}] {} '{}' {} {:.1}/{:.1}s x{} loop {} {:.1}-{:.1}",
                    slot.index(),
                    slot.video_id(),
                    slot.title(),
                    if slot.is_playing() { "playing" } else { "paused" },
                    slot.current_time(),
                    slot.duration(),
                    slot.playback_rate(),
                    if ls.enabled { "on" } else { "off" },
                    ls.start_time,
                    ls.end_time,
                );
            }
            Ok(())
        }
        (Some("play"), Some(i), _) => match i.parse() {
            Ok(index) => controller.toggle_play(index),
            Err(_) => {
                println!("usage: play <slot>");
                Ok(())
            }
        },
        (Some("speed"), Some(i), Some(rate)) => match (i.parse(), rate.parse()) {
            (Ok(index), Ok(rate)) => controller.set_playback_rate(index, rate),
            _ => {
                println!("usage: speed <slot> <rate>");
                Ok(())
            }
        },
        (Some("seek"), Some(i), Some(time)) => match (i.parse(), time.parse()) {
            (Ok(index), Ok(time)) => controller.seek(index, time),
            _ => {
                println!("usage: seek <slot> <seconds>");
                Ok(())
            }
        },
        (Some("loop"), Some(i), None) => match i.parse() {
            Ok(index) => controller.toggle_loop(index),
            Err(_) => {
                println!("usage: loop <slot>");
                Ok(())
            }
        },
        (Some("loopstart"), Some(i), Some(v)) => match (i.parse(), v.parse()) {
            (Ok(index), Ok(value)) => controller.update_loop(index, LoopEdge::Start, value),
            _ => {
                println!("usage: loopstart <slot> <seconds>");
                Ok(())
            }
        },
        (Some("loopend"), Some(i), Some(v)) => match (i.parse(), v.parse()) {
            (Ok(index), Ok(value)) => controller.update_loop(index, LoopEdge::End, value),
            _ => {
                println!("usage: loopend <slot> <seconds>");
                Ok(())
            }
        },
        (Some("nudge"), Some(i), Some(edge)) => {
            let step = parts.next().unwrap_or("+1");
            run_nudge(controller, i, edge, step)
        }
        (Some("video"), Some(i), Some(input)) => match i.parse() {
            Ok(index) => controller.change_video(index, input),
            Err(_) => {
                println!("usage: video <slot> <id-or-url>");
                Ok(())
            }
        },
        (Some("search"), Some(i), Some(first)) => match i.parse() {
            Ok(index) => {
                let keyword = std::iter::once(first)
                    .chain(parts)
                    .collect::<Vec<_>>()
                    .join(" ");
                controller.random_by_keyword(index, &keyword).await
            }
            Err(_) => {
                println!("usage: search <slot> <keyword...>");
                Ok(())
            }
        },
        (Some(other), _, _) => {
            println!("unknown command '{}', try 'help'", other);
            Ok(())
        }
    };

    if let Err(e) = result {
        println!("error: {}", e);
    }
    true
}

fn run_nudge(
    controller: &mut crate::control::Controller,
    index: &str,
    edge: &str,
    step: &str,
) -> Result<(), crate::control::ControlError> {
    let Ok(index) = index.parse() else {
        println!("usage: nudge <slot> start|end +1|-1|+0.1|-0.1");
        return Ok(());
    };
    let edge = match edge {
        "start" => LoopEdge::Start,
        "end" => LoopEdge::End,
        _ => {
            println!("usage: nudge <slot> start|end +1|-1|+0.1|-0.1");
            return Ok(());
        }
    };
    let delta = match step {
        "+1" => NUDGE_COARSE,
        "-1" => -NUDGE_COARSE,
        "+0.1" => NUDGE_FINE,
        "-0.1" => -NUDGE_FINE,
        _ => {
            println!("usage: nudge <slot> start|end +1|-1|+0.1|-0.1");
            return Ok(());
        }
    };
    controller.nudge_loop(index, edge, delta)
}

fn print_help() {
    println!("commands:");
    println!("  status                      show every slot");
    println!("  play <slot>                 toggle play/pause");
    println!("  speed <slot> <rate>         set playback rate (0.25..2)");
    println!("  seek <slot> <seconds>       seek absolute");
    println!("  loop <slot>                 toggle looping");
    println!("  loopstart <slot> <seconds>  move the loop start");
    println!("  loopend <slot> <seconds>    move the loop end");
    println!("  nudge <slot> start|end +1|-1|+0.1|-0.1");
    println!("  video <slot> <id-or-url>    swap the slot's video");
    println!("  search <slot> <keyword...>  random video by keyword");
    println!("  quit");
}
