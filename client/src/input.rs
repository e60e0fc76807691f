//! Line-oriented command input and translation into outbound messages

use shared::{ClientMessage, Point};
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_LINE_STEPS: usize = 8;
const MAX_LINE_STEPS: usize = 1000;

/// A single user command typed on stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Draw a straight stroke from one point to another.
    Line { from: Point, to: Point, steps: usize },
    Undo,
    Redo,
    Clear,
    Cursor { x: f64, y: f64 },
    Status,
    Quit,
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (try: line, undo, redo, clear, cursor, status, quit)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),
}

const LINE_USAGE: &str = "line <x1> <y1> <x2> <y2> [steps]";
const CURSOR_USAGE: &str = "cursor <x> <y>";

fn parse_coord(token: &str) -> Result<f64, ParseCommandError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseCommandError::InvalidNumber(token.to_string()))
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ParseCommandError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        let no_args = |command: Command, usage: &'static str| {
            if args.is_empty() {
                Ok(command)
            } else {
                Err(ParseCommandError::Usage(usage))
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "line" => {
                if args.len() != 4 && args.len() != 5 {
                    return Err(ParseCommandError::Usage(LINE_USAGE));
                }
                let from = Point(parse_coord(args[0])?, parse_coord(args[1])?);
                let to = Point(parse_coord(args[2])?, parse_coord(args[3])?);
                let steps = match args.get(4) {
                    Some(token) => token
                        .parse::<usize>()
                        .map_err(|_| ParseCommandError::InvalidNumber(token.to_string()))?,
                    None => DEFAULT_LINE_STEPS,
                };
                Ok(Command::Line {
                    from,
                    to,
                    steps: steps.clamp(1, MAX_LINE_STEPS),
                })
            }
            "cursor" => match args.as_slice() {
                [x, y] => Ok(Command::Cursor {
                    x: parse_coord(x)?,
                    y: parse_coord(y)?,
                }),
                _ => Err(ParseCommandError::Usage(CURSOR_USAGE)),
            },
            "undo" => no_args(Command::Undo, "undo"),
            "redo" => no_args(Command::Redo, "redo"),
            "clear" => no_args(Command::Clear, "clear"),
            "status" => no_args(Command::Status, "status"),
            "quit" | "exit" => no_args(Command::Quit, "quit"),
            other => Err(ParseCommandError::Unknown(other.to_string())),
        }
    }
}

/// Stroke style applied to lines drawn by this client.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub color: String,
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
            width: 3.0,
        }
    }
}

/// Expands a straight line into the DRAW_START / DRAW_MOVE / DRAW_END sequence
/// a pointer gesture would produce, with `steps` evenly spaced moves.
pub fn line_messages(
    stroke_id: &str,
    from: Point,
    to: Point,
    steps: usize,
    brush: &Brush,
) -> Vec<ClientMessage> {
    let steps = steps.max(1);
    let mut messages = Vec::with_capacity(steps + 2);

    messages.push(ClientMessage::DrawStart {
        stroke_id: stroke_id.to_string(),
        x: from.0,
        y: from.1,
        color: brush.color.clone(),
        width: brush.width,
    });

    for step in 1..=steps {
        let t = step as f64 / steps as f64;
        messages.push(ClientMessage::DrawMove {
            stroke_id: stroke_id.to_string(),
            x: from.0 + (to.0 - from.0) * t,
            y: from.1 + (to.1 - from.1) * t,
        });
    }

    messages.push(ClientMessage::DrawEnd {
        stroke_id: stroke_id.to_string(),
    });

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_parse_line_defaults_steps() {
        let command: Command = "line 0 0 10 20".parse().unwrap();
        assert_eq!(
            command,
            Command::Line {
                from: Point(0.0, 0.0),
                to: Point(10.0, 20.0),
                steps: DEFAULT_LINE_STEPS,
            }
        );
    }

    #[test]
    fn test_parse_line_clamps_steps() {
        let command: Command = "line 0 0 1 1 0".parse().unwrap();
        assert!(matches!(command, Command::Line { steps: 1, .. }));

        let command: Command = "line 0 0 1 1 999999".parse().unwrap();
        assert!(matches!(command, Command::Line { steps, .. } if steps == MAX_LINE_STEPS));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("undo".parse::<Command>(), Ok(Command::Undo));
        assert_eq!("  REDO ".parse::<Command>(), Ok(Command::Redo));
        assert_eq!("clear".parse::<Command>(), Ok(Command::Clear));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert_eq!("exit".parse::<Command>(), Ok(Command::Quit));
        assert_eq!(
            "cursor 4.5 -2".parse::<Command>(),
            Ok(Command::Cursor { x: 4.5, y: -2.0 })
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseCommandError::Empty));
        assert_eq!(
            "paint".parse::<Command>(),
            Err(ParseCommandError::Unknown("paint".to_string()))
        );
        assert_eq!(
            "line 1 2 3".parse::<Command>(),
            Err(ParseCommandError::Usage(LINE_USAGE))
        );
        assert_eq!(
            "cursor 1 abc".parse::<Command>(),
            Err(ParseCommandError::InvalidNumber("abc".to_string()))
        );
        assert_eq!(
            "cursor 1 NaN".parse::<Command>(),
            Err(ParseCommandError::InvalidNumber("NaN".to_string()))
        );
        assert_eq!(
            "undo now".parse::<Command>(),
            Err(ParseCommandError::Usage("undo"))
        );
    }

    #[test]
    fn test_line_messages_shape() {
        let brush = Brush {
            color: "#ff0000".to_string(),
            width: 5.0,
        };
        let messages = line_messages("s1", Point(0.0, 0.0), Point(10.0, 20.0), 4, &brush);

        assert_eq!(messages.len(), 6);
        assert!(matches!(
            &messages[0],
            ClientMessage::DrawStart { stroke_id, color, .. } if stroke_id == "s1" && color == "#ff0000"
        ));
        assert!(matches!(&messages[5], ClientMessage::DrawEnd { stroke_id } if stroke_id == "s1"));

        match &messages[2] {
            ClientMessage::DrawMove { x, y, .. } => {
                assert_approx_eq!(*x, 5.0);
                assert_approx_eq!(*y, 10.0);
            }
            other => panic!("expected DRAW_MOVE, got {:?}", other),
        }
        match &messages[4] {
            ClientMessage::DrawMove { x, y, .. } => {
                assert_approx_eq!(*x, 10.0);
                assert_approx_eq!(*y, 20.0);
            }
            other => panic!("expected DRAW_MOVE, got {:?}", other),
        }
    }

    #[test]
    fn test_line_messages_zero_steps_still_ends() {
        let messages = line_messages("s1", Point(1.0, 1.0), Point(2.0, 2.0), 0, &Brush::default());
        assert_eq!(messages.len(), 3);
    }
}
