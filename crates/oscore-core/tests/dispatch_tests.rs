//! End-to-end parse and dispatch tests

use oscore_core::{Method, OscServer};
use parking_lot::Mutex;
use rosc::{encoder, OscBundle, OscMessage, OscPacket, OscTime, OscType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn send(server: &mut OscServer, packet: &OscPacket) -> usize {
    let bytes = encoder::encode(packet).expect("Failed to encode OSC");
    server.buffer_mut()[..bytes.len()].copy_from_slice(&bytes);
    server.parse_buffer(bytes.len())
}

fn float_message(addr: &str, value: f32) -> OscPacket {
    OscPacket::Message(OscMessage {
        addr: addr.to_string(),
        args: vec![OscType::Float(value)],
    })
}

#[test]
fn test_pattern_dispatch_synth_freq() {
    let mut server = OscServer::new(1024);
    let received = Arc::new(Mutex::new(Vec::new()));

    let r = received.clone();
    server
        .try_add_method(
            "/synth/[0-9]/freq",
            Method::new(move |msg| r.lock().push(msg.read_float(0))),
        )
        .unwrap();

    assert_eq!(send(&mut server, &float_message("/synth/3/freq", 440.0)), 1);
    assert_eq!(*received.lock(), vec![440.0]);

    assert_eq!(send(&mut server, &float_message("/synth/x/freq", 220.0)), 1);
    assert_eq!(*received.lock(), vec![440.0]);

    // second hit goes through the promoted literal entry
    assert!(server.address_space().lock().methods("/synth/3/freq").is_some());
    send(&mut server, &float_message("/synth/3/freq", 880.0));
    assert_eq!(*received.lock(), vec![440.0, 880.0]);
}

#[test]
fn test_both_literal_handlers_invoked() {
    let mut server = OscServer::new(1024);
    let hits = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let h = hits.clone();
        server
            .try_add_method(
                "/fader/1",
                Method::new(move |_| {
                    h.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
    }

    send(&mut server, &float_message("/fader/1", 0.5));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn test_pattern_registered_twice_fires_twice() {
    let mut server = OscServer::new(1024);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let method = Method::new(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    server.try_add_method("/pat/*", method.clone()).unwrap();
    server.try_add_method("/pat/*", method).unwrap();

    send(&mut server, &float_message("/pat/1", 1.0));
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // second message takes the promoted literal entry
    send(&mut server, &float_message("/pat/1", 1.0));
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[test]
fn test_removed_method_is_not_invoked() {
    let mut server = OscServer::new(1024);
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let method = Method::new(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    server.try_add_method("/btn", method.clone()).unwrap();
    send(&mut server, &float_message("/btn", 1.0));
    assert!(server.remove_method("/btn", &method));
    send(&mut server, &float_message("/btn", 1.0));

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!server.remove_address_method("/btn"));
}

#[test]
fn test_bundle_dispatches_each_message() {
    let mut server = OscServer::new(1024);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let s = seen.clone();
    server
        .try_add_method(
            "/mix/*/gain",
            Method::new(move |msg| {
                s.lock()
                    .push((msg.address().to_string(), msg.read_float(0), msg.bundle_time()))
            }),
        )
        .unwrap();

    let bundle = OscPacket::Bundle(OscBundle {
        timetag: OscTime {
            seconds: 1,
            fractional: 0,
        },
        content: vec![
            float_message("/mix/1/gain", 0.1),
            float_message("/mix/2/gain", 0.2),
            float_message("/mix/2/pan", 0.3),
        ],
    });

    assert_eq!(send(&mut server, &bundle), 3);

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, "/mix/1/gain");
    assert_eq!(seen[1].1, 0.2);
    assert_eq!(seen[1].2, Some(oscore_core::Timestamp::new(1, 0)));
}
