//! Check system capabilities.

use vidsplice_render_engine::is_ffmpeg_available;

pub fn run() -> anyhow::Result<()> {
    println!("VidSplice System Check");
    println!("{}", "=".repeat(50));

    if is_ffmpeg_available() {
        println!("[OK] ffmpeg and ffprobe found on PATH");
        println!();
        println!("All required tools are available. VidSplice is ready.");
    } else {
        println!("[MISSING] ffmpeg/ffprobe not found on PATH");
        println!("     Install ffmpeg with libvpx-vp9 support to inspect and export videos.");
        println!();
        println!("Editing works; exporting needs ffmpeg.");
    }

    Ok(())
}
