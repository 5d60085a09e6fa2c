use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::config::parse_viewport;
use crate::models::Viewport;

pub const USAGE: &str = "\
usage: albumcmp [--db PATH] <command>

commands:
  scan <dir>                       add every image directory under <dir> as an album
  import <file.json>               add albums from a JSON export of the album store
  add --title T [--description D] <url>...
                                   create an album from image URLs
  list                             list catalog albums
  show <id>                        print an album's details and every image URL
  delete <id>                      remove an album from the catalog and the queue
  queue show                       show the saved comparison queue
  queue add <id>...                queue albums by id
  queue remove <id>...             remove albums from the queue
  queue clear                      empty the queue
  compare [--viewport WxH] [--index N]
                                   compare the queued albums at page N, or every page";

#[derive(Debug, Clone, PartialEq)]
pub enum QueueCommand {
    Show,
    Add(Vec<String>),
    Remove(Vec<String>),
    Clear,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Scan { root: PathBuf },
    Import { file: PathBuf },
    Add {
        title: String,
        description: String,
        urls: Vec<String>,
    },
    List,
    Show { id: String },
    Delete { id: String },
    Queue(QueueCommand),
    Compare {
        viewport: Option<Viewport>,
        index: Option<isize>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub db_path: Option<PathBuf>,
    pub command: Command,
}

pub fn parse_args<I>(args: I) -> Result<CliArgs>
where
    I: IntoIterator<Item = String>,
{
    let mut db_path: Option<PathBuf> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut viewport: Option<Viewport> = None;
    let mut index: Option<isize> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let value = args.next().context("Missing value for --db")?;
                db_path = Some(PathBuf::from(value));
            }
            "--viewport" => {
                let value = args.next().context("Missing value for --viewport")?;
                viewport = Some(parse_viewport(&value)?);
            }
            "--index" => {
                let value = args.next().context("Missing value for --index")?;
                index = Some(
                    value
                        .parse::<isize>()
                        .context("Failed to parse --index as an integer")?,
                );
            }
            "--title" => {
                title = Some(args.next().context("Missing value for --title")?);
            }
            "--description" => {
                description = Some(args.next().context("Missing value for --description")?);
            }
            "-h" | "--help" => {
                return Ok(CliArgs {
                    db_path,
                    command: Command::Help,
                })
            }
            _ if arg.starts_with("--") => bail!("Unknown option {}", arg),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None => Command::Help,
        Some("scan") => {
            let root = positional.next().context("scan needs a directory")?;
            Command::Scan {
                root: PathBuf::from(root),
            }
        }
        Some("import") => {
            let file = positional.next().context("import needs a JSON file")?;
            Command::Import {
                file: PathBuf::from(file),
            }
        }
        Some("add") => {
            let title = title
                .filter(|t| !t.trim().is_empty())
                .context("add needs a non-empty --title")?;
            let urls: Vec<String> = positional.by_ref().collect();
            if urls.iter().all(|u| u.trim().is_empty()) {
                bail!("add needs at least one image URL");
            }
            Command::Add {
                title,
                description: description.unwrap_or_default(),
                urls,
            }
        }
        Some("list") => Command::List,
        Some("show") => Command::Show {
            id: positional.next().context("show needs an album id")?,
        },
        Some("delete") => Command::Delete {
            id: positional.next().context("delete needs an album id")?,
        },
        Some("queue") => {
            let sub = positional.next();
            let ids: Vec<String> = positional.by_ref().collect();
            let queue = match sub.as_deref() {
                None | Some("show") => QueueCommand::Show,
                Some("clear") => QueueCommand::Clear,
                Some("add") if !ids.is_empty() => QueueCommand::Add(ids),
                Some("remove") if !ids.is_empty() => QueueCommand::Remove(ids),
                Some("add") | Some("remove") => bail!("queue add/remove needs at least one album id"),
                Some(other) => bail!("Unknown queue command {}", other),
            };
            Command::Queue(queue)
        }
        Some("compare") => Command::Compare { viewport, index },
        Some(other) => bail!("Unknown command {}\n\n{}", other, USAGE),
    };

    if let Some(extra) = positional.next() {
        bail!("Unexpected argument {}", extra);
    }

    Ok(CliArgs { db_path, command })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_scan_with_db() {
        let args = parse(&["--db", "/tmp/c.sqlite", "scan", "/photos"]).unwrap();
        assert_eq!(args.db_path, Some(PathBuf::from("/tmp/c.sqlite")));
        assert_eq!(
            args.command,
            Command::Scan {
                root: PathBuf::from("/photos")
            }
        );
    }

    #[test]
    fn test_import() {
        assert_eq!(
            parse(&["import", "albums.json"]).unwrap().command,
            Command::Import {
                file: PathBuf::from("albums.json")
            }
        );
        assert!(parse(&["import"]).is_err());
    }

    #[test]
    fn test_add_album() {
        let args = parse(&[
            "add",
            "--title",
            "Beach",
            "http://x.org/1.jpg",
            "--description",
            "sand",
            "https://x.org/2.jpg",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Add {
                title: "Beach".into(),
                description: "sand".into(),
                urls: vec!["http://x.org/1.jpg".into(), "https://x.org/2.jpg".into()],
            }
        );
        assert!(parse(&["add", "https://x.org/1.jpg"]).is_err());
        assert!(parse(&["add", "--title", " ", "https://x.org/1.jpg"]).is_err());
        assert!(parse(&["add", "--title", "Beach"]).is_err());
    }

    #[test]
    fn test_show_and_delete() {
        assert_eq!(
            parse(&["show", "abc"]).unwrap().command,
            Command::Show { id: "abc".into() }
        );
        assert_eq!(
            parse(&["delete", "abc"]).unwrap().command,
            Command::Delete { id: "abc".into() }
        );
        assert!(parse(&["show"]).is_err());
        assert!(parse(&["delete", "a", "b"]).is_err());
    }

    #[test]
    fn test_queue_commands() {
        assert_eq!(parse(&["queue"]).unwrap().command, Command::Queue(QueueCommand::Show));
        assert_eq!(
            parse(&["queue", "add", "a", "b"]).unwrap().command,
            Command::Queue(QueueCommand::Add(vec!["a".into(), "b".into()]))
        );
        assert!(parse(&["queue", "remove"]).is_err());
        assert!(parse(&["queue", "shuffle"]).is_err());
    }

    #[test]
    fn test_compare_options() {
        let args = parse(&["compare", "--viewport", "1200x800", "--index", "3"]).unwrap();
        assert_eq!(
            args.command,
            Command::Compare {
                viewport: Some(Viewport::new(1200.0, 800.0)),
                index: Some(3)
            }
        );
        assert!(parse(&["compare", "--index", "three"]).is_err());
        assert!(parse(&["compare", "--viewport"]).is_err());
    }

    #[test]
    fn test_help_and_errors() {
        assert_eq!(parse(&[]).unwrap().command, Command::Help);
        assert_eq!(parse(&["list", "--help"]).unwrap().command, Command::Help);
        assert!(parse(&["frobnicate"]).is_err());
        assert!(parse(&["list", "--verbose"]).is_err());
        assert!(parse(&["list", "extra"]).is_err());
    }
}
