// SPDX-FileCopyrightText: 2025 Contributors to the GStreamer OpenGL player backend project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the GL player backend.
//!
//! These tests drive the backend through its public surface. Most feed bus
//! messages straight into `handle_message`; `bus_watch_delivers_messages`
//! posts on the bus and iterates a private main context instead.
//!
//! # Requirements
//!
//! - GStreamer core elements (`playbin`, `fakesink`, `identity`) must be
//!   installed. The OpenGL elements are replaced with `identity` and
//!   `fakesink`, so no display is required.
//!
//! The pipeline never gets real media, so only the *requested* state is
//! checked for transitions above READY.

use std::sync::{Arc, Mutex};

use gst::prelude::*;
use gstplayerbackendgl::{BackendConfig, GlPlayerBackend, StopMode};
use gstreamer as gst;
use player_backend::PlayerBackend;
use tracing::info;

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// Initializes logging and returns a backend with headless elements.
fn setup_test() -> GlPlayerBackend {
    setup_test_with(BackendConfig::default())
}

fn setup_test_with(config: BackendConfig) -> GlPlayerBackend {
    // Initialize logging once (respects RUST_LOG environment variable)
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });

    let config = BackendConfig {
        video_sink: "fakesink".into(),
        upload: Some("identity".into()),
        widget_property: None,
        ..config
    };
    GlPlayerBackend::with_config(&config).unwrap()
}

#[test]
fn fresh_backend_defaults() {
    let backend = setup_test();

    assert_eq!(backend.volume(), 0.3);
    assert!(!backend.is_playing());
    assert_eq!(backend.buffer_fill(), 0.0);
    assert_eq!(backend.uri(), None);
    assert_eq!(backend.requested_state(), Some(gst::State::Null));
    assert!(gstplayerbackendgl::runtime::is_initialized());
}

#[test]
fn widget_is_stable() {
    let backend = setup_test();

    let first = backend.widget().unwrap();
    let second = backend.widget().unwrap();
    assert_eq!(first, second);
}

#[test]
fn volume_round_trips_and_clamps() {
    let backend = setup_test();
    let pipeline = backend.pipeline().unwrap();

    backend.set_volume(0.5);
    assert_eq!(backend.volume(), 0.5);
    assert_eq!(pipeline.property::<f64>("volume"), 0.5);

    backend.set_volume(1.7);
    assert_eq!(backend.volume(), 1.0);

    backend.set_volume(-3.0);
    assert_eq!(backend.volume(), 0.0);
    assert_eq!(pipeline.property::<f64>("volume"), 0.0);
}

#[test]
fn pipeline_volume_is_reflected() {
    let backend = setup_test();
    let notified = Arc::new(Mutex::new(Vec::new()));
    let seen = notified.clone();
    backend.connect_notify(Some("volume"), move |backend, _| {
        seen.lock().unwrap().push(backend.volume());
    });

    backend.pipeline().unwrap().set_property("volume", 0.7);

    assert_eq!(backend.volume(), 0.7);
    assert_eq!(*notified.lock().unwrap(), vec![0.7]);
}

#[test]
fn play_then_stop() {
    let backend = setup_test();

    backend.set_playing(true);
    assert!(backend.is_playing());
    assert_eq!(backend.requested_state(), Some(gst::State::Playing));

    backend.set_playing(false);
    assert!(!backend.is_playing());
    assert_eq!(backend.requested_state(), Some(gst::State::Null));
    assert_eq!(
        backend.pipeline().unwrap().current_state(),
        gst::State::Null
    );

    // stopping again is a no-op
    backend.set_playing(false);
    assert_eq!(
        backend.pipeline().unwrap().current_state(),
        gst::State::Null
    );
}

#[test]
fn stop_mode_ready() {
    let backend = setup_test_with(BackendConfig {
        stop_mode: StopMode::Ready,
        ..Default::default()
    });

    backend.set_playing(true);
    backend.set_playing(false);

    assert_eq!(backend.requested_state(), Some(gst::State::Ready));
    assert_eq!(
        backend.pipeline().unwrap().current_state(),
        gst::State::Ready
    );
}

#[test]
fn buffering_pauses_and_resumes() {
    let backend = setup_test();
    backend.set_playing(true);

    backend.handle_message(&gst::message::Buffering::new(40));
    assert_eq!(backend.requested_state(), Some(gst::State::Paused));
    assert!(backend.is_playing());
    assert_eq!(backend.buffer_fill(), 0.4);

    backend.handle_message(&gst::message::Buffering::new(100));
    assert_eq!(backend.requested_state(), Some(gst::State::Playing));
    assert!(backend.is_playing());
    assert_eq!(backend.buffer_fill(), 1.0);
}

#[test]
fn buffering_while_stopped_only_updates_fill() {
    let backend = setup_test();

    backend.handle_message(&gst::message::Buffering::new(25));

    assert_eq!(backend.buffer_fill(), 0.25);
    assert_eq!(backend.requested_state(), Some(gst::State::Null));
    assert!(!backend.is_playing());
}

#[test]
fn uri_is_stored_and_propagated() {
    let backend = setup_test();
    let pipeline = backend.pipeline().unwrap();

    backend.set_uri("file:///nonexistent/first.webm");
    assert_eq!(backend.uri().as_deref(), Some("file:///nonexistent/first.webm"));
    assert_eq!(
        pipeline.property::<Option<String>>("uri").as_deref(),
        Some("file:///nonexistent/first.webm")
    );

    backend.set_playing(true);
    backend.set_uri("file:///nonexistent/second.webm");
    info!("Requested state after uri change: {:?}", backend.requested_state());

    assert_eq!(
        pipeline.property::<Option<String>>("uri").as_deref(),
        Some("file:///nonexistent/second.webm")
    );
    assert!(backend.is_playing());
    assert_eq!(backend.requested_state(), Some(gst::State::Playing));
}

#[test]
fn pipeline_errors_are_forwarded() {
    let backend = setup_test();
    let received = Arc::new(Mutex::new(None));
    let sink = received.clone();
    backend.connect_error(move |_, message, debug| {
        *sink.lock().unwrap() = Some((message.to_owned(), debug.map(str::to_owned)));
    });

    let pipeline = backend.pipeline().unwrap();
    let msg = gst::message::Error::builder(gst::ResourceError::NotFound, "Resource not found")
        .debug("no such file")
        .src(&pipeline)
        .build();
    backend.handle_message(&msg);

    let received = received.lock().unwrap().clone();
    assert_eq!(
        received,
        Some((
            "Resource not found".to_owned(),
            Some("no such file".to_owned())
        ))
    );
}

#[test]
fn other_messages_keep_the_watch() {
    let backend = setup_test();

    let eos = gst::message::Eos::new();
    assert_eq!(backend.handle_message(&eos), gst::glib::ControlFlow::Continue);

    let warning = gst::message::Warning::new(gst::CoreError::Failed, "odd");
    assert_eq!(
        backend.handle_message(&warning),
        gst::glib::ControlFlow::Continue
    );
    assert_eq!(backend.requested_state(), Some(gst::State::Null));
}

#[test]
fn drop_while_buffering_stops_pipeline() {
    let backend = setup_test();
    backend.set_playing(true);
    backend.handle_message(&gst::message::Buffering::new(30));
    assert!(backend.is_buffering());

    let pipeline = backend.pipeline().unwrap();
    drop(backend);

    assert_eq!(pipeline.current_state(), gst::State::Null);
}

#[test]
fn drop_releases_pipeline_and_widget() {
    let backend = setup_test();
    let pipeline = backend.pipeline().unwrap().downgrade();
    let widget = backend.widget().unwrap().downgrade();

    drop(backend);

    assert!(pipeline.upgrade().is_none());
    assert!(widget.upgrade().is_none());
}

#[test]
fn usable_as_trait_object() {
    let backend: Box<dyn PlayerBackend> = Box::new(setup_test());

    backend.set_volume(0.9);
    backend.set_uri("file:///nonexistent/clip.webm");

    assert_eq!(backend.volume(), 0.9);
    assert_eq!(backend.uri().as_deref(), Some("file:///nonexistent/clip.webm"));
    assert!(backend.widget().is_some());
}

#[test]
fn bus_watch_delivers_messages() {
    // the watch attaches to the thread-default context
    let context = gst::glib::MainContext::new();
    context
        .with_thread_default(|| {
            let backend = setup_test();
            backend.set_playing(true);
            let bus = backend.pipeline().unwrap().bus().unwrap();

            bus.post(gst::message::Buffering::new(40)).unwrap();
            while context.iteration(false) {}

            assert_eq!(backend.buffer_fill(), 0.4);
            assert_eq!(backend.requested_state(), Some(gst::State::Paused));
            assert!(backend.is_playing());

            // a bus holds a single watch, so a second one is refused while ours is installed
            assert!(bus.add_watch(|_, _| gst::glib::ControlFlow::Continue).is_err());

            unsafe { backend.run_dispose() };
            let watch = bus.add_watch(|_, _| gst::glib::ControlFlow::Continue);
            assert!(watch.is_ok());
        })
        .unwrap();
}

#[test]
fn backend_is_shared_across_threads() {
    let backend = setup_test();
    let worker = backend.clone();

    std::thread::spawn(move || {
        worker.set_volume(0.2);
        worker.set_playing(true);
        worker.handle_message(&gst::message::Buffering::new(10));
        assert!(worker.widget().is_some());
    })
    .join()
    .unwrap();

    assert_eq!(backend.volume(), 0.2);
    assert!(backend.is_playing());
    assert!(backend.is_buffering());
}
