//! Full-stack tests: a real [`GridClient`] talking to a real
//! [`NetworkState`] over loopback, polled the way the viewer polls.

use std::io::Read;
use std::net::TcpListener;
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::client::GridClient;
use crate::model::{Event, Game};
use crate::server::NetworkState;

fn start_server() -> (NetworkState, u16) {
    let net = NetworkState::start(0).expect("bind ephemeral port");
    let port = net.local_port().expect("local port");
    (net, port)
}

/// Polls the server until `done` holds, panicking after five seconds.
fn poll_until(net: &mut NetworkState, game: &mut Game, done: impl Fn(&Game) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        net.poll(game);
        if done(game) {
            return;
        }
        if Instant::now() > deadline {
            panic!("timed out waiting for the expected model state");
        }
        sleep(Duration::from_millis(1));
    }
}

#[test]
fn solo_char_over_loopback() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    poll_until(&mut net, &mut game, |game| !game.runs.is_empty());

    let context = client.create_context();
    assert_eq!(context.id, 1);
    client.draw_char(&context, 3, 4, b'#');
    poll_until(&mut net, &mut game, |game| {
        game.runs[0].strokes[0].events.len() == 1
    });

    let run = &game.runs[0];
    assert_eq!(run.strokes.len(), 1);
    assert_eq!(run.strokes[0].title, b"Stroke 0");
    assert_eq!(run.selected_stroke, 1);
    assert_eq!(
        run.strokes[0].events[0],
        Event::CharPoint {
            fg: [0, 0, 0],
            bg: [255, 255, 255],
            ch: b'#',
            x: 3,
            y: 4,
        }
    );
}

#[test]
fn named_stroke_of_one_hundred_cells() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");

    let context = client.create_context();
    client.start_stroke("Parse");
    for y in 0..10 {
        for x in 0..10 {
            client.draw_char(&context, x, y, b'.');
        }
    }
    client.end_stroke();

    poll_until(&mut net, &mut game, |game| {
        game.runs
            .first()
            .is_some_and(|run| run.strokes[0].events.len() == 100)
    });

    let run = &game.runs[0];
    assert_eq!(run.strokes.len(), 1);
    assert_eq!(run.strokes[0].title, b"Parse");
}

#[test]
fn color_change_mid_stroke_latches_per_event() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");

    let mut context = client.create_context();
    client.start_stroke("S");
    client.draw_char(&context, 0, 0, b'A');
    client.set_fg(&mut context, 255, 0, 0);
    client.draw_char(&context, 1, 0, b'B');
    client.end_stroke();

    poll_until(&mut net, &mut game, |game| {
        game.runs
            .first()
            .is_some_and(|run| run.strokes[0].events.len() == 2)
    });

    let events = &game.runs[0].strokes[0].events;
    let Event::CharPoint { fg: fg_a, .. } = events[0];
    let Event::CharPoint { fg: fg_b, .. } = events[1];
    assert_eq!(fg_a, [0, 0, 0]);
    assert_eq!(fg_b, [255, 0, 0]);
}

#[test]
fn reconnect_creates_a_second_run() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    let context = client.create_context();
    client.draw_char(&context, 0, 0, b'x');
    poll_until(&mut net, &mut game, |game| {
        game.runs
            .first()
            .is_some_and(|run| !run.strokes[0].events.is_empty())
    });

    client.disconnect();
    client.connect(port).expect("reconnect");
    let context = client.create_context();
    client.draw_char(&context, 1, 1, b'y');

    poll_until(&mut net, &mut game, |game| {
        game.runs.len() == 2 && !game.runs[1].strokes[0].events.is_empty()
    });
    assert_eq!(game.selected_run, 1);
    // The first run survives its connection.
    assert_eq!(game.runs[0].strokes[0].events.len(), 1);
}

#[test]
fn unstroked_draws_open_one_stroke_each() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    let context = client.create_context();
    client.draw_char(&context, 0, 0, b'a');
    client.draw_char(&context, 1, 0, b'b');

    poll_until(&mut net, &mut game, |game| {
        game.runs.first().is_some_and(|run| {
            run.strokes.len() == 2 && run.strokes.iter().all(|stroke| stroke.events.len() == 1)
        })
    });

    let run = &game.runs[0];
    // The first dummy stroke reuses the seeded one; the second appends.
    assert_eq!(run.strokes[0].title, b"Stroke 0");
    assert_eq!(run.strokes[1].title, b"Stroke 1");
    assert_eq!(run.selected_stroke, 2);
}

#[test]
fn bare_draw_char_emits_the_documented_bytes() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    let (mut peer, _) = listener.accept().expect("accept");

    let context = client.create_context();
    client.draw_char(&context, 3, 4, b'#');

    // Dummy stroke start followed by the char frame, exactly 25 bytes.
    let mut buf = [0u8; 25];
    peer.set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    peer.read_exact(&mut buf).expect("read frames");
    assert_eq!(buf[..5], [0x03, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(
        buf[5..],
        [
            0x04, 0x01, 0x00, // tag, context id 1
            0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // x = 3
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // y = 4
            0x23, // '#'
        ]
    );
}

#[test]
fn client_goes_silent_after_losing_the_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    let (peer, _) = listener.accept().expect("accept");
    drop(peer);

    // Writes keep succeeding until the reset comes back; give it a moment.
    let context = client.create_context();
    let deadline = Instant::now() + Duration::from_secs(5);
    while client.is_connected() {
        client.draw_char(&context, 0, 0, b'x');
        if Instant::now() > deadline {
            panic!("client never noticed the lost connection");
        }
        sleep(Duration::from_millis(5));
    }

    // Every later call is a no-op, not a panic or an error.
    client.draw_char(&context, 0, 0, b'x');
    client.start_stroke("after loss");
    client.end_stroke();
    assert!(!client.is_connected());
}

#[test]
fn draw_string_shares_one_stroke_and_one_cell() {
    let (mut net, port) = start_server();
    let mut game = Game::default();

    let mut client = GridClient::new();
    client.connect(port).expect("connect");
    let context = client.create_context();
    client.draw_string(&context, 2, 3, "hi");

    poll_until(&mut net, &mut game, |game| {
        game.runs
            .first()
            .is_some_and(|run| run.strokes[0].events.len() == 2)
    });

    let run = &game.runs[0];
    assert_eq!(run.strokes.len(), 1);
    for (event, expected) in run.strokes[0].events.iter().zip([b'h', b'i']) {
        let Event::CharPoint { ch, x, y, .. } = *event;
        assert_eq!(ch, expected);
        // Every byte lands on the same cell; the cursor never advances.
        assert_eq!((x, y), (2, 3));
    }
}
