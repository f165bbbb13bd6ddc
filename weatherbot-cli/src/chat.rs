use anyhow::{Context, Result};
use std::{fs, path::Path};
use weatherbot_core::{Reply, WeatherBot};

/// A chat message resolved to one of the bot's commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<'a> {
    Weather(&'a str),
    Help,
    Provider(Option<&'a str>),
    Pref {
        option: Option<&'a str>,
        value: Option<&'a str>,
    },
    Moon,
}

/// Route `text` the way a chat plugin host would. `None` means the message
/// is not addressed to the bot.
pub fn route<'a>(prefix: &str, text: &'a str) -> Option<Invocation<'a>> {
    let body = text.trim().strip_prefix(prefix)?;
    let (command, rest) = split_word(body);

    match command {
        "weather" => {
            let (sub, args) = split_word(rest);
            Some(match sub {
                "help" => Invocation::Help,
                "provider" => Invocation::Provider(non_empty(split_word(args).0)),
                "pref" => {
                    let (option, value) = split_word(args);
                    Invocation::Pref {
                        option: non_empty(option),
                        value: non_empty(value),
                    }
                }
                _ => Invocation::Weather(rest),
            })
        }
        "moon" => Some(Invocation::Moon),
        _ => None,
    }
}

pub async fn dispatch(bot: &WeatherBot, sender: &str, invocation: Invocation<'_>) -> Vec<Reply> {
    match invocation {
        Invocation::Weather(raw) => bot.weather(sender, raw).await,
        Invocation::Help => vec![bot.help()],
        Invocation::Provider(name) => vec![bot.provider(sender, name).await],
        Invocation::Pref { option, value } => vec![bot.pref(sender, option, value).await],
        Invocation::Moon => vec![bot.moon(sender).await],
    }
}

/// Print text replies; write images into `image_dir` when given.
pub fn deliver(replies: &[Reply], image_dir: Option<&Path>) -> Result<()> {
    for reply in replies {
        match reply {
            Reply::Text(msg) => println!("{msg}"),
            Reply::Image { filename, data } => match image_dir {
                Some(dir) => {
                    fs::create_dir_all(dir).with_context(|| {
                        format!("Failed to create image directory: {}", dir.display())
                    })?;
                    let path = dir.join(sanitize_filename(filename));
                    fs::write(&path, data)
                        .with_context(|| format!("Failed to write image: {}", path.display()))?;
                    println!("[image saved to {}]", path.display());
                }
                None => println!("[image {filename}, {} bytes]", data.len()),
            },
        }
    }
    Ok(())
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}
