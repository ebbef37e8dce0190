use crate::types::SavedLine;

const MAX_WIDTH: usize = 80;

/// ASCII layout of one saved line: the bar drawn to scale, one segment per
/// cut, the discarded residue filled with dots.
///
/// ```text
/// +--------------------+-------------+------+
/// |        3.00        |    2.00     |......|
/// +--------------------+-------------+------+
/// ```
pub fn render_line(line: &SavedLine) -> String {
    if line.original <= 0.0 {
        return String::new();
    }
    let scale = MAX_WIDTH as f64 / line.original;

    // Boundaries come from cumulative lengths so rounding never drifts.
    let mut bounds = vec![0usize];
    let mut cum = 0.0;
    for &cut in &line.cuts {
        cum += cut;
        bounds.push(((cum * scale).round() as usize).min(MAX_WIDTH));
    }
    if line.residue > 0.0 {
        bounds.push(MAX_WIDTH);
    }

    let mut border = vec!['-'; MAX_WIDTH + 1];
    let mut mid = vec![' '; MAX_WIDTH + 1];
    for &b in &bounds {
        border[b] = '+';
        mid[b] = '|';
    }

    if line.residue > 0.0 && bounds.len() >= 2 {
        let start = bounds[bounds.len() - 2];
        for x in start + 1..MAX_WIDTH {
            if mid[x] == ' ' {
                mid[x] = '.';
            }
        }
    }

    for (k, &cut) in line.cuts.iter().enumerate() {
        let (s, e) = (bounds[k], bounds[k + 1]);
        let label: Vec<char> = format!("{cut:.2}").chars().collect();
        let interior = e.saturating_sub(s + 1);
        if label.len() <= interior {
            let start = s + 1 + (interior - label.len()) / 2;
            for (i, &ch) in label.iter().enumerate() {
                mid[start + i] = ch;
            }
        }
    }

    let mut out = String::new();
    for row in [&border, &mid, &border] {
        let text: String = row.iter().collect();
        out.push_str(text.trim_end());
        out.push('\n');
    }
    out
}
