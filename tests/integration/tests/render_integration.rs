//! Integration tests for the render bridge
//!
//! A headless surface stands in for the host's OpenGL context; the
//! in-memory core records every frame the bridge asks it to draw.

use anyhow::Result;
use mpv_object::render::RawDisplayHandle;
use mpv_object::{Framebuffer, RendererState, Signal};
use mpv_object_integration_tests::{HeadlessSurface, TestFixture, TestPlayer};

#[test]
fn test_renderer_from_facade() -> Result<()> {
    let mut player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("xcb");

    let mut renderer = player.object.create_renderer(&mut surface);
    assert!(surface.persistent_context);
    assert!(surface.persistent_scene_graph);
    assert_eq!(renderer.state(), RendererState::Uninitialized);
    assert_eq!(player.mpv.render_contexts_created(), 0);

    let framebuffer = renderer.create_framebuffer(&mut surface, 1920, 1080)?;
    assert_eq!(framebuffer, Framebuffer::new(1, 1920, 1080));
    assert_eq!(renderer.state(), RendererState::Initialized);
    assert_eq!(player.settle(), vec![Signal::InitFinished]);

    Ok(())
}

#[test]
fn test_frames_follow_update_requests() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("wayland");
    let mut renderer = player.object.create_renderer(&mut surface);
    renderer.create_framebuffer(&mut surface, 1280, 720)?;

    player.load(&fixture.media_files.video, 30.0)?;
    player.take_signals();

    // Host loop: redraw once per update request
    for _ in 0..3 {
        assert!(player.mpv.request_redraw());
        let signals = player.settle();
        if signals.contains(&Signal::UpdateRequested) {
            renderer.render(&mut surface)?;
        }
    }

    assert_eq!(player.mpv.renders().len(), 3);
    assert!(player.mpv.renders().iter().all(|(_, flip)| *flip));
    assert_eq!(surface.state_resets, 6);

    Ok(())
}

#[test]
fn test_resize_keeps_render_context() -> Result<()> {
    let player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("xcb");
    let mut renderer = player.object.create_renderer(&mut surface);

    renderer.create_framebuffer(&mut surface, 640, 480)?;
    renderer.create_framebuffer(&mut surface, 800, 600)?;
    renderer.render(&mut surface)?;

    assert_eq!(player.mpv.render_contexts_created(), 1);
    assert_eq!(surface.framebuffers.len(), 2);
    assert_eq!(
        player.mpv.renders(),
        vec![(Framebuffer::new(2, 800, 600), true)]
    );

    Ok(())
}

#[test]
fn test_explicit_target_and_flip() -> Result<()> {
    let player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("xcb");
    let mut renderer = player.object.create_renderer(&mut surface);
    renderer.create_framebuffer(&mut surface, 320, 240)?;

    renderer.set_flip_y(false);
    let target = Framebuffer::new(42, 64, 64);
    renderer.render_to(&mut surface, &target)?;

    assert_eq!(player.mpv.renders(), vec![(target, false)]);

    Ok(())
}

#[test]
fn test_render_without_framebuffer_fails() -> Result<()> {
    let player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("xcb");
    let mut renderer = player.object.create_renderer(&mut surface);

    assert!(renderer.render(&mut surface).is_err());
    assert!(player.mpv.renders().is_empty());
    assert_eq!(surface.state_resets, 0);

    Ok(())
}

#[test]
fn test_drop_detaches_from_core() -> Result<()> {
    let mut player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("xcb");
    let mut renderer = player.object.create_renderer(&mut surface);
    renderer.create_framebuffer(&mut surface, 64, 64)?;
    player.settle();

    drop(renderer);
    assert_eq!(player.mpv.render_contexts_alive(), 0);
    assert!(!player.mpv.request_redraw());
    assert!(player.settle().is_empty());

    Ok(())
}

#[test]
fn test_display_is_optional() -> Result<()> {
    let player = TestPlayer::new()?;
    let mut surface = HeadlessSurface::new("offscreen");
    surface.display = None::<RawDisplayHandle>;
    let mut renderer = player.object.create_renderer(&mut surface);

    renderer.create_framebuffer(&mut surface, 16, 16)?;
    assert!(renderer.is_initialized());

    Ok(())
}
