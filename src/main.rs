use bar_optimizer::planner::{DEFAULT_MIN_RESIDUE, Planner};
use bar_optimizer::render;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bar_optimizer", about = "1D bar cutting stock planner")]
struct Cli {
    /// Stock bar length in meters (e.g. 6 or 6.1)
    #[arg(long)]
    stock: f64,

    /// Requested pieces as LEN or LEN:QTY (e.g. 1.84 2.5:3)
    #[arg(long = "pieces", num_args = 1..)]
    pieces: Vec<String>,

    /// Minimum reusable leftover in meters; shorter scrap ends the bar
    #[arg(long, default_value_t = DEFAULT_MIN_RESIDUE)]
    min_residue: f64,

    /// Show ASCII layout of each bar
    #[arg(long)]
    layout: bool,
}

fn parse_piece(s: &str) -> Result<(f64, u32), String> {
    let (len_part, qty_part) = match s.split_once(':') {
        Some((l, q)) => (l, Some(q)),
        None => (s, None),
    };
    let length = len_part
        .parse::<f64>()
        .map_err(|_| format!("invalid length in '{}'", s))?;
    if length <= 0.0 {
        return Err(format!("length must be positive in '{}'", s));
    }
    let qty = match qty_part {
        Some(q) => q
            .parse::<u32>()
            .map_err(|_| format!("invalid quantity in '{}'", s))?,
        None => 1,
    };
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    Ok((length, qty))
}

fn main() {
    let cli = Cli::parse();

    if cli.stock <= 0.0 {
        eprintln!("Error: stock length must be positive");
        std::process::exit(1);
    }

    let pieces: Vec<(f64, u32)> = cli
        .pieces
        .iter()
        .map(|p| parse_piece(p))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    // Pieces longer than the stock can never be cut
    for &(length, _) in &pieces {
        if length > cli.stock {
            eprintln!(
                "Error: piece {:.2} m does not fit in stock {:.2} m",
                length, cli.stock
            );
            std::process::exit(1);
        }
    }

    let mut planner = Planner::new(cli.min_residue);
    for &(length, qty) in &pieces {
        planner.add_pieces(length, qty).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
    }

    // One bar at a time: open with the longest piece that fits, fill it
    // greedily, archive the line.
    let mut bar = 0;
    loop {
        let first = match planner.best_first_piece(cli.stock) {
            Some(p) => p.id,
            None => break,
        };
        let line = planner
            .start(cli.stock, first)
            .and_then(|_| planner.auto_plan())
            .and_then(|_| planner.save_line())
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

        bar += 1;
        let cuts: Vec<String> = line.cuts.iter().map(|c| format!("{c:.2}m")).collect();
        println!(
            "Bar {}: {:.2} m  cuts: {}  residue: {:.2} m",
            bar,
            line.original,
            cuts.join("  |  "),
            line.residue
        );
        if cli.layout {
            print!("{}", render::render_line(&line));
        }
    }

    let (in_play, _, _) = planner.inventory().status_counts();
    if in_play > 0 {
        let leftover: Vec<String> = planner
            .inventory()
            .candidates_at_most(f64::INFINITY)
            .map(|p| format!("{:.2}m", p.length))
            .collect();
        println!("Unplaced pieces: {}", leftover.join("  |  "));
    }

    println!(
        "Summary: {} bar{} used, {:.1}% waste",
        bar,
        if bar == 1 { "" } else { "s" },
        planner.total_waste_percent(),
    );
}
