//! Headless annotation shell: reads one command per line from stdin.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use bbox_annotator::config::AppConfig;
use bbox_annotator::format::{FrameSource, FsFrameSource};
use bbox_annotator::message::Notification;
use bbox_annotator::{Editor, EditorError, EditorSettings};

const HELP: &str = "\
commands:
  n | p              next / previous frame
  g <frame>          go to frame (1-based)
  ] | [              next / previous box (crosses frames)
  sel <box>          select box (0-based)
  a                  add a box
  d                  delete the selected box
  c <class>          set class of the selected box
  cd <class>         set detailed class of the selected box (empty clears)
  cap <text>         set caption of the selected box (empty clears)
  b <x1> <y1> <x2> <y2>  set coordinates of the selected box
  l                  list boxes
  s                  save now
  q                  save and quit";

fn main() -> ExitCode {
    let config_path = AppConfig::default_path();
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());
    let config = AppConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
    log::debug!("Log level {}", config.log_level.name());

    if !config_exists {
        if let Err(e) = config.save_to_default_path() {
            log::warn!("Could not write default configuration: {}", e);
        }
    }

    let mut args = std::env::args().skip(1);
    let (image_dir, json_dir) = match (args.next(), args.next()) {
        (Some(images), Some(jsons)) => (PathBuf::from(images), PathBuf::from(jsons)),
        (None, None) => (config.image_dir.clone(), config.json_dir.clone()),
        _ => {
            eprintln!("usage: bbox-annotator [IMAGE_DIR JSON_DIR]");
            return ExitCode::FAILURE;
        }
    };

    let source = match FsFrameSource::discover(&image_dir, &json_dir) {
        Ok(source) => source,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut editor = Editor::new(
        source,
        config.class_vocabulary(),
        config.detailed_class_vocabulary(),
        EditorSettings::from(&config),
    );

    match run(&mut editor) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(editor: &mut Editor<FsFrameSource>) -> Result<(), EditorError> {
    editor.restore_session()?;
    report(editor);

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Failed to read input: {}", e);
                break;
            }
        };
        let (command, rest) = match line.trim().split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };
        if command == "q" {
            break;
        }
        // A failed command leaves the editor usable; report and carry on.
        if let Err(e) = execute(editor, command, rest) {
            eprintln!("Error: {}", e);
        }
        editor.tick();
        report(editor);
    }

    editor.close()
}

fn execute(
    editor: &mut Editor<FsFrameSource>,
    command: &str,
    rest: &str,
) -> Result<(), EditorError> {
    let selected = editor.selected_box();
    match command {
        "" => {}
        "n" => {
            editor.next_frame()?;
        }
        "p" => {
            editor.previous_frame()?;
        }
        "g" => match rest.parse::<usize>() {
            Ok(frame) if frame > 0 => editor.load_frame(frame - 1, None)?,
            _ => println!("frame numbers start at 1"),
        },
        "]" => editor.select_next_box()?,
        "[" => editor.select_prev_box()?,
        "sel" => {
            let selected = rest
                .parse::<usize>()
                .is_ok_and(|index| editor.set_selected_box(Some(index)));
            if !selected {
                println!("no box {}", rest);
            }
        }
        "a" => {
            if editor.add_box().is_none() {
                println!("no image loaded");
            }
        }
        "d" => match selected {
            Some(index) => {
                editor.delete_box(index);
            }
            None => println!("select a box first"),
        },
        "c" | "cd" | "cap" | "b" => {
            let Some(index) = selected else {
                println!("select a box first");
                return Ok(());
            };
            edit(editor, index, command, rest);
        }
        "l" => list(editor),
        "s" => editor.save_now()?,
        "h" | "help" | "?" => println!("{}", HELP),
        other => println!("unknown command {:?}, try help", other),
    }
    Ok(())
}

fn edit(editor: &mut Editor<FsFrameSource>, index: usize, command: &str, rest: &str) {
    match command {
        "c" => {
            if let Some(class) = editor.commit_class(index, rest) {
                println!("class: {}", class);
            }
        }
        "cd" => {
            if let Some(class) = editor.commit_class_detailed(index, rest) {
                println!("detailed class: {}", class);
            }
        }
        "cap" => {
            editor.set_caption(index, rest);
        }
        _ => {
            let coords: Vec<f64> = rest
                .split_whitespace()
                .filter_map(|v| v.parse().ok())
                .collect();
            let accepted = <[f64; 4]>::try_from(coords.as_slice())
                .is_ok_and(|coords| editor.set_box(index, coords));
            if !accepted {
                println!("invalid box");
            }
        }
    }
}

fn list(editor: &Editor<FsFrameSource>) {
    let selected = editor.selected_box();
    for (i, ann) in editor.store().annotations().iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        let b = ann.bbox;
        println!(
            "{} {}: {} [{}, {}, {}, {}]{}",
            marker,
            i,
            ann.class,
            b.x1,
            b.y1,
            b.x2,
            b.y2,
            ann.class_detailed
                .as_deref()
                .map(|c| format!(" ({})", c))
                .unwrap_or_default()
        );
    }
}

fn report(editor: &mut Editor<FsFrameSource>) {
    let mut frame_changed = false;
    for note in editor.take_notifications() {
        log::debug!("{:?}", note);
        match note {
            Notification::FrameLoaded(_) => frame_changed = true,
            Notification::SaveFailed(frame) => println!("save failed for frame {}", frame + 1),
            _ => {}
        }
    }
    if frame_changed {
        print_status(editor);
    }
}

fn print_status(editor: &Editor<FsFrameSource>) {
    let frame = editor.current_frame();
    println!(
        "frame {}/{} {} - {} boxes, selected {:?}",
        frame + 1,
        editor.frame_count(),
        editor.source().frame_name(frame),
        editor.store().len(),
        editor.selected_box()
    );
}
