//! Building many short lines, then streaming them to stdout.
//!
//! Run with:
//!     cargo run --example build_report

use std::io::{self, Write};

use strpool::{Pool, PoolError};

const ROWS: usize = 12;

fn main() -> Result<(), PoolError> {
    let mut pool = Pool::new();
    pool.reserve_handles(ROWS + 1)?;

    // Row lines live at 1..=ROWS, handle 0 is the header
    pool.assign(0, b"row  name        score")?;
    for row in 1..=ROWS {
        let mut line = pool.entry(row);
        line.format(format_args!("{row:>3}  "))?;
        line.append(format!("player-{:<6}", row * 7 % 13).as_bytes())?;
        line.append(format!("{:>5}", row * row * 31 % 997).as_bytes())?;
    }

    // Rewrite a few rows in place
    for row in (2..=ROWS).step_by(4) {
        let index = pool.find(row, b"player-")?.unwrap_or(0);
        pool.set_byte(row, index, b'P')?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for handle in 0..pool.count() {
        pool.write_to(handle, &mut out)?;
        out.write_all(b"\n")?;
    }

    let stats = pool.stats();
    writeln!(
        out,
        "\n{} lines, {} live bytes, {} garbage, {} compactions",
        pool.count(),
        stats.live_bytes,
        stats.garbage_size,
        stats.compactions
    )?;

    Ok(())
}
