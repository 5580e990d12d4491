//! Integration tests for configuration files and how they reach mpv

use anyhow::Result;
use mpv_object::mpv::MpvValue;
use mpv_object::{CallType, Config, LogLevel};
use mpv_object_integration_tests::{TestFixture, TestPlayer};

#[test]
fn test_defaults_change_nothing() -> Result<()> {
    let mut player = TestPlayer::new()?;
    player.mpv.clear_calls();

    assert_eq!(player.object.apply_config(&Config::default()), 0);
    assert!(player.mpv.commands().is_empty());
    assert!(player.settle().is_empty());

    Ok(())
}

#[test]
fn test_partial_file_keeps_defaults() -> Result<()> {
    let fixture = TestFixture::new()?;
    let path = fixture.write_config(
        r#"
[playback]
volume = 35
hwdec = "auto-safe"

[subtitles]
sub_codepage = "cp1250"
"#,
    )?;

    let config = Config::load_from(&path)?;
    assert_eq!(config.playback.volume, 35);
    assert_eq!(config.playback.hwdec.as_deref(), Some("auto-safe"));
    assert_eq!(config.playback.speed, 1.0);
    assert_eq!(config.subtitles.sub_auto, "exact");
    assert_eq!(config.screenshot.jpeg_quality, 90);
    assert_eq!(config.general.call_type, CallType::Synchronous);

    Ok(())
}

#[test]
fn test_file_applied_to_player() -> Result<()> {
    let fixture = TestFixture::new()?;
    let path = fixture.write_config(
        r#"
[general]
mpv_log_level = "warning"

[playback]
volume = 35
speed = 1.25
hr_seek = true
profile = "fast"

[subtitles]
sub_codepage = "cp1250"

[screenshot]
format = "png"
png_compression = 3
"#,
    )?;
    let config = Config::load_from(&path)?;
    let mut player = TestPlayer::new()?;

    // log level, volume, speed, hr-seek, codepage, format, compression, profile
    assert_eq!(player.object.apply_config(&config), 8);

    assert_eq!(player.object.log_level(), LogLevel::Warning);
    assert_eq!(player.object.volume(), 35);
    assert_eq!(player.object.speed(), 1.25);
    assert!(player.object.hr_seek());
    assert_eq!(player.object.sub_codepage(), "cp1250");
    assert_eq!(player.mpv.writes("sub-codepage"), vec![MpvValue::from("+cp1250")]);
    assert_eq!(player.object.screenshot_format(), "png");
    assert_eq!(player.object.screenshot_png_compression(), 3);
    assert!(player
        .mpv
        .commands()
        .contains(&vec![MpvValue::from("apply-profile"), MpvValue::from("fast")]));

    // A second pass finds everything in place
    assert_eq!(player.object.apply_config(&config), 1);

    Ok(())
}

#[test]
fn test_asynchronous_config() -> Result<()> {
    let fixture = TestFixture::new()?;
    let path = fixture.write_config("[general]\ncall_type = \"asynchronous\"\n")?;
    let config = Config::load_from(&path)?;
    let mut player = TestPlayer::new()?;

    assert_eq!(player.object.apply_config(&config), 1);
    assert_eq!(player.object.call_type(), CallType::Asynchronous);

    Ok(())
}

#[test]
fn test_invalid_files_rejected() -> Result<()> {
    let fixture = TestFixture::new()?;

    let path = fixture.write_config("[playback]\nvolume = 150\n")?;
    assert!(Config::load_from(&path).is_err());

    let path = fixture.write_config("[screenshot]\nformat = \"bmp\"\n")?;
    assert!(Config::load_from(&path).is_err());

    let path = fixture.write_config("[playback\nvolume = 10\n")?;
    assert!(Config::load_from(&path).is_err());

    let path = fixture.write_config("[general]\nmpv_log_level = \"loud\"\n")?;
    assert!(Config::load_from(&path).is_err());

    Ok(())
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let fixture = TestFixture::new()?;
    let path = fixture.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.playback.volume = 60;
    config.playback.profile = Some("low-latency".to_string());
    config.screenshot.directory = Some(fixture.path().join("shots"));
    config.general.mpv_log_level = LogLevel::Info;
    config.save_to(&path)?;

    assert_eq!(Config::load_from(&path)?, config);

    Ok(())
}
