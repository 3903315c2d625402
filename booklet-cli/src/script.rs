//! Turn scripts for replaying interactions.
//!
//! A script is a list of whitespace or comma separated actions:
//!
//! | action                  | meaning                                         |
//! |-------------------------|-------------------------------------------------|
//! | `n`, `next`             | click the next control                          |
//! | `p`, `prev`             | click the prev control                          |
//! | `c`, `close`            | click the close control                         |
//! | `w`, `wait`             | wait one animation duration                     |
//! | `w250`, `wait:250`      | wait 250 ms                                     |
//! | `drag:right:0:-120`     | drag page 0 of the right panel 120 px leftwards |

use anyhow::{anyhow, bail, Context, Result};
use libbooklet::{Command, Control, PageId, Panel};

/// Horizontal position every scripted drag starts from.
const DRAG_ORIGIN_X: i32 = 1000;

fn click(control: Control) -> Vec<Command> {
    vec![Command::Click { control }]
}

fn parse_drag(spec: &str) -> Result<Vec<Command>> {
    let parts: Vec<&str> = spec.split(':').collect();
    let [panel, index, dx] = parts.as_slice() else {
        bail!("drag needs panel, page and distance, e.g. drag:right:0:-120");
    };
    let panel = match *panel {
        "left" | "l" => Panel::Left,
        "right" | "r" => Panel::Right,
        other => bail!("unknown panel '{other}'"),
    };
    let index: usize = index
        .parse()
        .with_context(|| format!("bad page index '{index}'"))?;
    let dx: i32 = dx
        .parse()
        .with_context(|| format!("bad drag distance '{dx}'"))?;
    let page = PageId::new(panel, index);
    Ok(vec![
        Command::PointerDown {
            page,
            x: DRAG_ORIGIN_X,
        },
        Command::PointerUp {
            page,
            x: DRAG_ORIGIN_X.saturating_add(dx),
        },
    ])
}

fn parse_action(action: &str, speed: u32) -> Result<Vec<Command>> {
    let commands = match action {
        "n" | "next" => click(Control::Next),
        "p" | "prev" => click(Control::Prev),
        "c" | "close" => click(Control::Close),
        "w" | "wait" => vec![Command::Wait {
            ms: u64::from(speed),
        }],
        _ => {
            if let Some(drag) = action.strip_prefix("drag:") {
                return parse_drag(drag);
            }
            let ms = action
                .strip_prefix("wait:")
                .or_else(|| action.strip_prefix('w'))
                .ok_or_else(|| anyhow!("unknown action '{action}'"))?;
            let ms: u64 = ms
                .parse()
                .with_context(|| format!("bad wait duration in '{action}'"))?;
            vec![Command::Wait { ms }]
        }
    };
    Ok(commands)
}

/// Parses `script`; bare waits last `speed` milliseconds.
pub fn parse_script(script: &str, speed: u32) -> Result<Vec<(String, Vec<Command>)>> {
    script
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|a| !a.is_empty())
        .map(|action| {
            let action = action.to_lowercase();
            let commands = parse_action(&action, speed)?;
            Ok((action, commands))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commands(script: &str) -> Vec<Command> {
        parse_script(script, 720)
            .unwrap()
            .into_iter()
            .flat_map(|(_, c)| c)
            .collect()
    }

    #[test]
    fn clicks_and_waits() {
        assert_eq!(
            commands("n, w p w250 close wait:10"),
            vec![
                Command::Click {
                    control: Control::Next
                },
                Command::Wait { ms: 720 },
                Command::Click {
                    control: Control::Prev
                },
                Command::Wait { ms: 250 },
                Command::Click {
                    control: Control::Close
                },
                Command::Wait { ms: 10 },
            ]
        );
    }

    #[test]
    fn drag_expands_to_pointer_pair() {
        let page = PageId::new(Panel::Right, 2);
        assert_eq!(
            commands("drag:right:2:-120"),
            vec![
                Command::PointerDown { page, x: 1000 },
                Command::PointerUp { page, x: 880 },
            ]
        );
    }

    #[test]
    fn documented_actions_parse() {
        let script = "n next p prev c close w wait w250 wait:250 drag:right:0:-120 drag:l:1:40";
        let actions = parse_script(script, 720).unwrap();
        assert_eq!(actions.len(), 12);
        assert_eq!(
            actions[11].1,
            vec![
                Command::PointerDown {
                    page: PageId::new(Panel::Left, 1),
                    x: 1000
                },
                Command::PointerUp {
                    page: PageId::new(Panel::Left, 1),
                    x: 1040
                },
            ]
        );
    }

    #[test]
    fn bad_actions_fail() {
        assert!(parse_script("jump", 720).is_err());
        assert!(parse_script("wfast", 720).is_err());
        assert!(parse_script("drag:up:0:10", 720).is_err());
        assert!(parse_script("drag:left:0", 720).is_err());
        assert!(parse_script("<0", 720).is_err());
        assert!(parse_script(">1", 720).is_err());
    }

    #[test]
    fn empty_script_is_empty() {
        assert!(parse_script(" , ", 720).unwrap().is_empty());
    }
}
