//! Demo emitter: streams a randomized 10x10 grid "parse" to a running
//! viewer, then knocks out random cells one stroke at a time.

use anyhow::Context as _;
use clap::Parser;
use rand::Rng;

use netgridviz::client::GridClient;
use netgridviz::protocol::DEFAULT_PORT;

#[derive(Parser, Debug)]
#[command(name = "grid-demo", about = "Stream a demo grid to a running netgridviz viewer")]
struct Cli {
    #[arg(long, short = 'p', default_value_t = DEFAULT_PORT)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut client = GridClient::new();
    client
        .connect(cli.port)
        .with_context(|| format!("failed to connect to a viewer on port {}", cli.port))?;

    let normal = client.create_context();
    let mut destroyed = client.create_context();
    client.set_fg(&mut destroyed, 0xff, 0x00, 0x00);

    let mut rng = rand::thread_rng();
    let mut grid = [[b'.'; 10]; 10];

    // Visualize a grid as it is "parsed".
    client.start_stroke("Parse");
    for y in 0..10 {
        for x in 0..10 {
            grid[y][x] = if rng.gen_bool(0.5) { b'#' } else { b'.' };
            client.draw_char(&normal, x as i64, y as i64, grid[y][x]);
        }
    }
    client.end_stroke();

    // Random destruction; each draw lands in its own stroke.
    for y in 0..10 {
        for x in 0..10 {
            if grid[y][x] == b'#' && rng.gen_range(0..4) == 0 {
                grid[y][x] = b'.';
                client.draw_char(&destroyed, x as i64, y as i64, grid[y][x]);
            }
        }
    }

    client.disconnect();
    Ok(())
}
