// palette_core/src/slotcmd.rs
use crate::Palette;
use crate::color::Color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWord {
    Num(usize),
    Thru,
    At,
    Color(Color),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyStatus {
    Applied,
    Incomplete,     // valid so far, but needs more tokens
    NotSlotCommand, // doesn't look like slot syntax
}

fn lex(input: &str) -> Vec<String> {
    input.split_whitespace().map(|s| s.to_string()).collect()
}

fn parse_words(tokens: &[String]) -> Result<Vec<SlotWord>, ApplyStatus> {
    if tokens.is_empty() {
        return Err(ApplyStatus::NotSlotCommand);
    }

    // Slot syntax always starts with a slot number
    if tokens[0].parse::<usize>().is_err() {
        return Err(ApplyStatus::NotSlotCommand);
    }

    let mut out = Vec::new();
    let mut after_at = false;
    for t in tokens {
        let low = t.to_lowercase();
        let w = match low.as_str() {
            "thru" => SlotWord::Thru,
            "@" => {
                after_at = true;
                SlotWord::At
            }
            _ if after_at => match low.parse::<Color>() {
                Ok(c) => SlotWord::Color(c),
                Err(_) => return Err(ApplyStatus::NotSlotCommand),
            },
            _ => match low.parse::<usize>() {
                Ok(n) => SlotWord::Num(n),
                Err(_) => return Err(ApplyStatus::NotSlotCommand),
            },
        };
        out.push(w);
    }

    Ok(out)
}

/// Applies `<a> [thru <b>] [@ <color>]` to `palette`.
///
/// Slots outside the palette are skipped. Without `@ <color>` the line is a
/// selection only and `selection` is updated but nothing is written.
pub fn try_apply_slot_line(
    line: &str,
    palette: &mut Palette,
    selection: &mut Vec<usize>,
) -> ApplyStatus {
    let tokens = lex(line);
    let words = match parse_words(&tokens) {
        Ok(w) => w,
        Err(status) => return status,
    };

    // Grammar:
    // <a>
    // <a> thru <b>
    // (optional) @ <color>
    //
    // Examples:
    // 3
    // 1 thru 15
    // 1 thru 15 @ #000000

    let mut i = 0;

    let a = match words.get(i) {
        Some(SlotWord::Num(n)) => *n,
        _ => return ApplyStatus::NotSlotCommand,
    };
    i += 1;

    let (sel_a, sel_b) = match words.get(i) {
        Some(SlotWord::Thru) => {
            i += 1;
            let b = match words.get(i) {
                Some(SlotWord::Num(n)) => *n,
                _ => return ApplyStatus::Incomplete, // "1 thru" (waiting for end)
            };
            i += 1;
            (a, b)
        }
        _ => (a, a),
    };

    let color = match words.get(i) {
        None => None,
        Some(SlotWord::At) => {
            i += 1;
            match words.get(i) {
                Some(SlotWord::Color(c)) => Some(*c),
                _ => return ApplyStatus::Incomplete, // "3 @"
            }
        }
        _ => return ApplyStatus::NotSlotCommand,
    };
    if words.len() > i + usize::from(color.is_some()) {
        return ApplyStatus::NotSlotCommand;
    }

    let (start, end) = if sel_a <= sel_b {
        (sel_a, sel_b)
    } else {
        (sel_b, sel_a)
    };
    selection.clear();
    if start < palette.len() {
        let end = end.min(palette.len() - 1);
        selection.extend(start..=end);
    }

    if let Some(color) = color {
        for &slot in selection.iter() {
            palette.set_color(slot, color);
        }
    }

    ApplyStatus::Applied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_range_with_color() {
        let mut p = Palette::new(16);
        let mut sel = Vec::new();
        let st = try_apply_slot_line("1 thru 15 @ #FFFFFF", &mut p, &mut sel);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(sel.len(), 15);
        assert_eq!(p.color(0), Some(Color::BLACK));
        assert_eq!(p.color(1), Some(Color::WHITE));
        assert_eq!(p.color(15), Some(Color::WHITE));
    }

    #[test]
    fn reversed_range_and_out_of_bounds_slots() {
        let mut p = Palette::new(4);
        let mut sel = Vec::new();
        let st = try_apply_slot_line("9 thru 2 @ 0x00ff00", &mut p, &mut sel);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(sel, vec![2, 3]);
        assert_eq!(p.color(3), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn incomplete_thru_is_incomplete() {
        let mut p = Palette::new(16);
        let mut sel = Vec::new();
        assert_eq!(
            try_apply_slot_line("3 thru", &mut p, &mut sel),
            ApplyStatus::Incomplete
        );
        assert_eq!(
            try_apply_slot_line("3 @", &mut p, &mut sel),
            ApplyStatus::Incomplete
        );
    }

    #[test]
    fn non_slot_lines_are_ignored() {
        let mut p = Palette::new(16);
        let mut sel = Vec::new();
        for line in ["help", "fade black 100", "3 @ nope", ""] {
            assert_eq!(
                try_apply_slot_line(line, &mut p, &mut sel),
                ApplyStatus::NotSlotCommand,
                "{line:?}"
            );
        }
        assert_eq!(p, Palette::new(16));
    }

    #[test]
    fn huge_range_is_clamped_to_palette() {
        let mut p = Palette::new(16);
        let mut sel = Vec::new();
        let line = format!("0 thru {} @ #FFFFFF", usize::MAX);
        assert_eq!(
            try_apply_slot_line(&line, &mut p, &mut sel),
            ApplyStatus::Applied
        );
        assert_eq!(sel, (0..16).collect::<Vec<_>>());
        assert_eq!(p.colors(), vec![Color::WHITE; 16]);

        let line = format!("{} thru {}", usize::MAX - 1, usize::MAX);
        assert_eq!(
            try_apply_slot_line(&line, &mut p, &mut sel),
            ApplyStatus::Applied
        );
        assert!(sel.is_empty());
    }

    #[test]
    fn trailing_words_leave_selection_alone() {
        let mut p = Palette::new(16);
        let mut sel = vec![1];
        for line in ["3 thru 5 6", "3 @ #FFFFFF 7", "3 thru 5 @ #FFFFFF @"] {
            assert_eq!(
                try_apply_slot_line(line, &mut p, &mut sel),
                ApplyStatus::NotSlotCommand,
                "{line:?}"
            );
        }
        assert_eq!(sel, vec![1]);
        assert_eq!(p, Palette::new(16));
    }

    #[test]
    fn selection_without_color_writes_nothing() {
        let mut p = Palette::new(16);
        let mut sel = Vec::new();
        let st = try_apply_slot_line("5", &mut p, &mut sel);
        assert_eq!(st, ApplyStatus::Applied);
        assert_eq!(sel, vec![5]);
        assert_eq!(p, Palette::new(16));
    }
}
