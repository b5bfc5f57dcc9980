//! Dia Board command line
//!
//! Runs the board store natively against a JSON file that stands in for
//! browser local storage.
//!
//! ```text
//! dia-board [--store PATH] [--config PATH] <command>
//!   show <board-id>              print the stored board
//!   add-note [--kind KIND] <board-id> <title> [body]
//!   new-id                       print a fresh element id
//!   clear <board-id>             forget a stored board
//! ```

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::path::PathBuf;
    use std::rc::Rc;

    use dia_board::model::{ElementKind, Position};
    use dia_board::storage::FileStorage;
    use dia_board::{
        BoardStorage, BoardStore, Clock, Config, Element, LoadStatus, SystemClock,
        UnknownElementKind, logging,
    };

    const DEFAULT_STORE_PATH: &str = "dia-boards.json";
    /// Horizontal offset between consecutive notes added from the CLI
    const NOTE_STAGGER: f64 = 24.0;

    pub const USAGE: &str = "usage: dia-board [--store PATH] [--config PATH] \
        <show <board-id> | add-note [--kind KIND] <board-id> <title> [body] | new-id | clear <board-id>>";

    #[derive(Debug, PartialEq)]
    pub enum Command {
        Show { board_id: String },
        AddNote {
            board_id: String,
            kind: ElementKind,
            title: String,
            body: Option<String>,
        },
        NewId,
        Clear { board_id: String },
    }

    #[derive(Debug, PartialEq)]
    pub struct Options {
        pub store: PathBuf,
        pub config: Option<PathBuf>,
        pub command: Command,
    }

    pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options, String> {
        let mut store = PathBuf::from(DEFAULT_STORE_PATH);
        let mut config = None;
        let mut kind = ElementKind::Note;
        let mut rest = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => store = args.next().ok_or("--store needs a path")?.into(),
                "--config" => config = Some(args.next().ok_or("--config needs a path")?.into()),
                "--kind" => {
                    let name = args.next().ok_or("--kind needs an element type")?;
                    kind = name.parse().map_err(|err: UnknownElementKind| err.to_string())?;
                }
                _ => rest.push(arg),
            }
        }

        let mut rest = rest.into_iter();
        let command = match rest.next().as_deref() {
            Some("show") => Command::Show {
                board_id: rest.next().ok_or("show needs a board id")?,
            },
            Some("add-note") => Command::AddNote {
                board_id: rest.next().ok_or("add-note needs a board id")?,
                kind,
                title: rest.next().ok_or("add-note needs a title")?,
                body: rest.next(),
            },
            Some("new-id") => Command::NewId,
            Some("clear") => Command::Clear {
                board_id: rest.next().ok_or("clear needs a board id")?,
            },
            Some(other) => return Err(format!("unknown command `{other}`")),
            None => return Err("missing command".to_string()),
        };

        Ok(Options {
            store,
            config,
            command,
        })
    }

    pub fn run(options: Options) -> Result<(), Box<dyn Error>> {
        let config = match &options.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        logging::init(config.level_filter()?);

        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let backend = FileStorage::open(&options.store)?;
        let storage =
            BoardStorage::new(Rc::new(backend), clock).with_key_prefix(config.storage_key_prefix);
        let mut store = BoardStore::new(storage);

        match options.command {
            Command::Show { board_id } => {
                let loaded = store.storage().load(&board_id)?;
                if loaded.is_fresh() {
                    log::info!("Board `{board_id}` has not been saved yet");
                }
                println!("{}", serde_json::to_string_pretty(loaded.board())?);
            }
            Command::AddNote {
                board_id,
                kind,
                title,
                body,
            } => {
                if let LoadStatus::Failed(err) = store.initialize(&board_id)? {
                    return Err(err.into());
                }
                let (count, top) = store.board().with(|board| {
                    board
                        .as_ref()
                        .map(|b| (b.elements.len(), b.top_z_index()))
                        .unwrap_or_default()
                });

                let id = store.generate_element_id();
                let offset = NOTE_STAGGER * count as f64;
                let now = store.storage().now();
                let position = Position::new(offset, offset);
                let mut note = Element::new(id.clone(), kind, position, now)
                    .with_title(title)
                    .with_z_index(top.map_or(0, |z| z + 1));
                if let Some(body) = body {
                    note = note.with_body(body);
                }

                store.add_element(note);
                store.cleanup();
                println!("{id}");
            }
            Command::NewId => println!("{}", store.generate_element_id()),
            Command::Clear { board_id } => store.storage().remove(&board_id)?,
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use dia_board::Board;

        fn args(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        #[test]
        fn test_parse_add_note_with_flags() {
            let options = parse_args(args(&[
                "--store", "/tmp/b.json", "--kind", "task", "add-note", "day-1", "Retro",
                "went well",
            ]))
            .unwrap();
            assert_eq!(options.store, PathBuf::from("/tmp/b.json"));
            assert_eq!(
                options.command,
                Command::AddNote {
                    board_id: "day-1".into(),
                    kind: ElementKind::Task,
                    title: "Retro".into(),
                    body: Some("went well".into()),
                }
            );
        }

        #[test]
        fn test_parse_errors() {
            assert!(parse_args(args(&[])).is_err());
            assert!(parse_args(args(&["show"])).is_err());
            assert!(parse_args(args(&["frobnicate"])).is_err());
            assert!(parse_args(args(&["new-id", "--store"])).is_err());
            assert_eq!(
                parse_args(args(&["--kind", "sticker", "add-note", "b", "t"])),
                Err("unknown element type `sticker`".to_string())
            );
        }

        #[test]
        fn test_add_note_persists_across_runs() {
            let dir = tempfile::tempdir().unwrap();
            let store = dir.path().join("boards.json");
            for title in ["one", "two"] {
                run(Options {
                    store: store.clone(),
                    config: None,
                    command: Command::AddNote {
                        board_id: "day-1".into(),
                        kind: ElementKind::Note,
                        title: title.into(),
                        body: None,
                    },
                })
                .unwrap();
            }

            let raw = std::fs::read_to_string(&store).unwrap();
            let entries: std::collections::BTreeMap<String, String> =
                serde_json::from_str(&raw).unwrap();
            let board: Board = serde_json::from_str(&entries["board_day-1"]).unwrap();
            assert_eq!(board.elements.len(), 2);
            assert_eq!(board.elements[1].z_index, 1);
            assert_eq!(board.elements[1].content.title.as_deref(), Some("two"));
            assert_eq!(board.elements[1].kind, ElementKind::Note);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    let options = match cli::parse_args(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}\n{}", cli::USAGE);
            return std::process::ExitCode::from(2);
        }
    };
    match cli::run(options) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}

/// The browser build is driven through `dia_board::wasm::BoardHandle`
#[cfg(target_arch = "wasm32")]
fn main() {}
