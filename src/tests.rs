//!
//! # Ebl21 Unit & Integration Tests
//!

// Std-Lib
use std::fs;

// Crates.io
use tempfile::TempDir;

// Local Imports
use crate::data::{EbConfig, EbConfigBuilder, EbResult};
use crate::dots::DotChain;
use crate::grid::{out_of_dose, quantize};
use crate::marker::{marker_cells, ANCHOR_CELLS, COL_BIT_CELLS, ROW_BIT_CELLS};
use crate::tile::TileGridBuilder;
use crate::write::Cc6Writer;

/// Open a session in a fresh temp directory.
/// The [TempDir] must stay alive until the output files have been read.
fn session(config: EbConfig) -> EbResult<(TempDir, String, Cc6Writer)> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("pattern").to_str().unwrap().to_string();
    let writer = Cc6Writer::open(config, &base)?;
    Ok((dir, base, writer))
}
/// Read the CC6 stream back as CRLF-separated lines
fn cc6_lines(base: &str) -> Vec<String> {
    let text = fs::read_to_string(format!("{}.CC6", base)).unwrap();
    text.split("\r\n").map(str::to_string).collect()
}

#[test]
fn it_quantizes_idempotently() {
    let config = EbConfig::default();
    // Every on-grid coordinate across the field maps to itself
    let steps = (config.field_size / config.unit) as i64;
    for step in (0..=steps).step_by(1000) {
        let v = step as f64 * config.unit;
        assert_eq!(quantize(v, config.unit), v);
    }
    // Off-grid coordinates snap to the nearest multiple;
    // exact halves round away from zero
    assert_eq!(quantize(7.4, 5.0), 5.0);
    assert_eq!(quantize(7.5, 5.0), 10.0);
    assert_eq!(quantize(12.5, 5.0), 15.0);
    assert_eq!(quantize(-2.5, 5.0), -5.0);
}

#[test]
fn it_checks_dose_bounds_inclusively() {
    assert!(!out_of_dose(0.1, 0.1, 3200.0));
    assert!(!out_of_dose(3200.0, 0.1, 3200.0));
    assert!(!out_of_dose(2.0, 0.1, 3200.0));
    assert!(out_of_dose(0.09, 0.1, 3200.0));
    assert!(out_of_dose(3200.5, 0.1, 3200.0));
}

#[test]
fn it_writes_the_cc6_stream() -> EbResult<()> {
    // End-to-end check of the full stream syntax for one accepted line
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 2.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.errors, 0);
    assert!(!stats.cap_exceeded);

    let text = fs::read_to_string(format!("{}.CC6", base))?;
    assert_eq!(
        text,
        "PATTERN\r\nDWLL(0,60000,200,59800,2.0) ;3\r\nEND\r\n\u{1a}"
    );
    drop(dir);
    Ok(())
}

#[test]
fn it_mirrors_only_the_command_stream() -> EbResult<()> {
    // The stream encodes y as field_size - y; the drawing keeps y as-is
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_line(0.0, 0.0, 1000.0, 2000.0, 2.0)?;
    writer.close()?;

    let lines = cc6_lines(&base);
    assert_eq!(lines[1], "DWLL(0,60000,200,59600,2.0) ;3");

    let dxf = fs::read_to_string(format!("{}.dxf", base))?;
    // Group 21 carries the line's y2, unmirrored
    assert!(dxf.contains("LINE"));
    assert!(dxf.contains("21\r\n2000\r\n"));
    assert!(!dxf.contains("298000"));
    drop(dir);
    Ok(())
}

#[test]
fn it_rejects_and_conserves_counters() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    let mut calls = 0u64;

    // Degenerate line: endpoints coincide after snapping to the 5 nm grid
    writer.draw_line(0.0, 0.0, 2.0, 2.0, 2.0)?;
    calls += 1;
    assert_eq!(writer.errors(), 1);
    // Degenerate rectangles: corners sharing an x or a y
    writer.draw_rect_filled(100.0, 100.0, 100.0, 2000.0, 2.0)?;
    calls += 1;
    writer.draw_rect_outline(100.0, 500.0, 2000.0, 500.0, 2.0)?;
    calls += 1;
    // Out-of-bounds endpoints
    writer.draw_line(-100.0, 0.0, 1000.0, 1000.0, 2.0)?;
    calls += 1;
    writer.draw_spot(0.0, 400_000.0, 2.0)?;
    calls += 1;
    // Out-of-range doses
    writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 0.01)?;
    calls += 1;
    writer.draw_spot(1000.0, 1000.0, 5000.0)?;
    calls += 1;
    assert_eq!(writer.accepted(), 0);
    assert_eq!(writer.errors(), calls);

    // Interleave accepted calls; the two counters always sum to the call count
    writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 2.0)?;
    calls += 1;
    writer.draw_line(1000.0, 1000.0, 1002.0, 1002.0, 2.0)?;
    calls += 1;
    writer.draw_spot(2000.0, 2000.0, 1.0)?;
    calls += 1;
    assert_eq!(writer.accepted() + writer.errors(), calls);
    assert_eq!(writer.accepted(), 2);

    let stats = writer.close()?;
    assert_eq!(stats.accepted + stats.errors, calls);

    // Nothing was emitted for the rejected shapes
    let lines = cc6_lines(&base);
    let emitted = lines
        .iter()
        .filter(|l| l.starts_with("DWLL") || l.starts_with("DWSL") || l.starts_with("DWSPS"))
        .count();
    assert_eq!(emitted, 2);
    drop(dir);
    Ok(())
}

#[test]
fn it_normalizes_rectangle_corners() -> EbResult<()> {
    // Either corner order yields the same top-left / bottom-right edges
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_rect_outline(2000.0, 1000.0, 1000.0, 2000.0, 2.0)?;
    writer.draw_rect_outline(1000.0, 2000.0, 2000.0, 1000.0, 2.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 2);

    let lines = cc6_lines(&base);
    assert_eq!(lines[1], "DWLL(200,59600,400,59600,2.0) ;3"); // top
    assert_eq!(lines[2], "DWLL(200,59800,400,59800,2.0) ;3"); // bottom
    assert_eq!(lines[3], "DWLL(200,59600,200,59800,2.0) ;3"); // left
    assert_eq!(lines[4], "DWLL(400,59600,400,59800,2.0) ;3"); // right
    assert_eq!(lines[1..5], lines[5..9]);
    drop(dir);
    Ok(())
}

#[test]
fn it_encodes_filled_rectangles_and_spots() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_rect_filled(1000.0, 1000.0, 2000.0, 2000.0, 3.0)?;
    writer.draw_spot(1000.0, 1000.0, 1.0)?;
    writer.close()?;

    let lines = cc6_lines(&base);
    assert_eq!(lines[1], "DWSL(200,59600,400,59800,1,3.0) ;3");
    assert_eq!(lines[2], "DWSPS(200,59800,10,1.0) ;2");

    let dxf = fs::read_to_string(format!("{}.dxf", base))?;
    // Rectangle: one closed polyline. Spot: circle plus crosshair.
    assert!(dxf.contains("POLYLINE"));
    assert!(dxf.contains("SEQEND"));
    assert!(dxf.contains("CIRCLE"));
    assert_eq!(dxf.matches("\r\nLINE\r\n").count(), 2);
    drop(dir);
    Ok(())
}

#[test]
fn it_keeps_commands_in_call_order() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_spot(1000.0, 1000.0, 1.0)?;
    writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 2.0)?;
    writer.draw_rect_filled(1000.0, 1000.0, 2000.0, 2000.0, 3.0)?;
    writer.close()?;

    let lines = cc6_lines(&base);
    assert!(lines[1].starts_with("DWSPS"));
    assert!(lines[2].starts_with("DWLL"));
    assert!(lines[3].starts_with("DWSL"));
    drop(dir);
    Ok(())
}

/// Invert the fixed offset table: recover (col, row) from a rectangle set
fn decode_marker(cells: &[[f64; 4]]) -> (u8, u8) {
    for anchor in ANCHOR_CELLS.iter() {
        assert!(cells.contains(anchor), "anchor missing from marker");
    }
    let mut col = 0u8;
    let mut row = 0u8;
    for bit in 0..5 {
        if cells.contains(&COL_BIT_CELLS[bit]) {
            col |= 1 << bit;
        }
        if cells.contains(&ROW_BIT_CELLS[bit]) {
            row |= 1 << bit;
        }
    }
    (col, row)
}

#[test]
fn it_decodes_markers() {
    for (col, row) in [(0u8, 0u8), (5, 0), (0, 17), (31, 31)] {
        let cells = marker_cells(col, row);
        assert_eq!(decode_marker(&cells), (col, row));
        // Anchors plus one rectangle per set bit
        assert_eq!(
            cells.len(),
            2 + col.count_ones() as usize + row.count_ones() as usize
        );
    }
}

#[test]
#[should_panic(expected = "out of 5-bit range")]
fn it_refuses_oversized_marker_codes() {
    marker_cells(32, 0);
}

#[test]
fn it_renders_markers_in_both_styles() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    // col=5 sets bits 0 and 2: two anchors + two bit cells
    writer.draw_marker(5, 0, 150_000.0, 150_000.0, 1.0, 1400.0)?;
    writer.draw_line_marker(5, 0, 100_000.0, 100_000.0, 0.5, 140_000.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.accepted, 8);

    let lines = cc6_lines(&base);
    let filled = lines.iter().filter(|l| l.starts_with("DWSL")).count();
    let edges = lines.iter().filter(|l| l.starts_with("DWLL")).count();
    assert_eq!(filled, 4);
    // Outlined rectangles write four edge lines each
    assert_eq!(edges, 16);
    drop(dir);
    Ok(())
}

#[test]
fn it_places_dot_chains() -> EbResult<()> {
    let mut chain = DotChain::new(3);
    chain.set_origin(0, 0.0, 0.0);
    // Slot 0 upgrades itself in place: a 160 nm dot along the x-axis
    chain.set_dot(0, 0, 0.0, 0.0, 160.0, 0.0, 50.0);
    // Slot 1 sits 200 nm along +x from slot 0, oriented vertically
    chain.set_dot(0, 1, 200.0, 0.0, 100.0, 90.0, 50.0);
    // Slot 2 sits 200 nm along +y from slot 1, horizontal again
    chain.set_dot(1, 2, 200.0, 90.0, 100.0, 0.0, 50.0);

    let spec0 = chain.get(0).unwrap();
    assert!((spec0.p1.x + 80.0).abs() < 1e-9);
    assert!((spec0.p2.x - 80.0).abs() < 1e-9);
    let spec1 = chain.get(1).unwrap();
    assert!((spec1.origin.x - 200.0).abs() < 1e-9);
    assert!((spec1.p1.y + 50.0).abs() < 1e-9);
    assert!((spec1.p2.y - 50.0).abs() < 1e-9);
    let spec2 = chain.get(2).unwrap();
    assert!((spec2.origin.y - 200.0).abs() < 1e-9);

    let (dir, _base, mut writer) = session(EbConfig::default())?;
    chain.draw(&mut writer, 150_000.0, 150_000.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.errors, 0);
    drop(dir);
    Ok(())
}

#[test]
#[should_panic(expected = "referenced before being set")]
fn it_panics_on_unset_references() {
    let mut chain = DotChain::new(3);
    chain.set_origin(0, 0.0, 0.0);
    // Slot 1 was never seeded or placed
    chain.set_dot(1, 2, 100.0, 0.0, 50.0, 0.0, 1.0);
}

#[test]
#[should_panic(expected = "out of range")]
fn it_panics_on_dangling_references() {
    let mut chain = DotChain::new(2);
    chain.set_origin(0, 0.0, 0.0);
    chain.set_dot(5, 1, 100.0, 0.0, 50.0, 0.0, 1.0);
}

#[test]
fn it_tiles_with_markers() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    let grid = TileGridBuilder::default()
        .inner_cols(2usize)
        .inner_rows(2usize)
        .outer_cols(2usize)
        .outer_rows(2usize)
        .cell_width(5000.0)
        .cell_height(5000.0)
        .build()?;
    writer.tile(&grid, |w, site| w.draw_spot(site.cx, site.cy, 1.0))?;
    let stats = writer.close()?;
    assert_eq!(stats.errors, 0);
    // 4 blocks x 4 cells of spots, plus markers (0,0) (1,0) (0,1) (1,1):
    // anchors and set bits give 2 + 3 + 3 + 4 rectangles
    assert_eq!(stats.accepted, 16 + 12);

    let lines = cc6_lines(&base);
    assert_eq!(lines.iter().filter(|l| l.starts_with("DWSPS")).count(), 16);
    assert_eq!(lines.iter().filter(|l| l.starts_with("DWSL")).count(), 12);
    drop(dir);
    Ok(())
}

#[test]
fn it_tiles_the_full_field_without_markers() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.tile_full_field(30_000.0, 30_000.0, |w, site| {
        w.draw_spot(site.cx, site.cy, 1.0)
    })?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 100);
    assert_eq!(stats.errors, 0);

    let lines = cc6_lines(&base);
    assert_eq!(lines.iter().filter(|l| l.starts_with("DWSL")).count(), 0);
    drop(dir);
    Ok(())
}

#[test]
fn it_rejects_undrawable_tile_grids() -> EbResult<()> {
    let (dir, _base, mut writer) = session(EbConfig::default())?;
    let grid = TileGridBuilder::default()
        .inner_cols(0usize)
        .inner_rows(2usize)
        .cell_width(5000.0)
        .cell_height(5000.0)
        .build()?;
    assert!(writer.tile(&grid, |w, site| w.draw_spot(site.cx, site.cy, 1.0)).is_err());
    writer.close()?;
    drop(dir);
    Ok(())
}

#[test]
fn it_warns_past_the_command_cap() -> EbResult<()> {
    let config = EbConfigBuilder::default().max_commands(1u64).build()?;
    let (dir, base, mut writer) = session(config)?;
    writer.draw_line(0.0, 0.0, 1000.0, 1000.0, 2.0)?;
    writer.draw_line(0.0, 0.0, 2000.0, 2000.0, 2.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 2);
    assert!(stats.cap_exceeded);

    // Both files are still finalized despite the warning
    let text = fs::read_to_string(format!("{}.CC6", base))?;
    assert!(text.ends_with("END\r\n\u{1a}"));
    let log = fs::read_to_string(format!("{}_log.txt", base))?;
    assert!(log.contains("Objects:"));
    assert!(log.contains("Errors:"));
    assert!(log.contains("exceeded maximum limit"));
    drop(dir);
    Ok(())
}

#[test]
fn it_draws_chip_markers() -> EbResult<()> {
    let (dir, base, mut writer) = session(EbConfig::default())?;
    writer.draw_chip_marker(3000.0, 4.0)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 4);
    assert_eq!(stats.errors, 0);

    let lines = cc6_lines(&base);
    // Left bar: (0, 3000)-(3000, 297000) in nm
    assert_eq!(lines[1], "DWSL(0,600,600,59400,1,4.0) ;3");
    drop(dir);
    Ok(())
}

#[test]
fn it_draws_stigma_checkers() -> EbResult<()> {
    let (dir, _base, mut writer) = session(EbConfig::default())?;
    writer.draw_stigma_checker(20_000.0, 18_000.0, 2000.0, 1000.0, 40.0, 8)?;
    let stats = writer.close()?;
    assert_eq!(stats.accepted, 8);
    assert_eq!(stats.errors, 0);
    drop(dir);
    Ok(())
}

#[test]
fn it_round_trips_config() -> EbResult<()> {
    let config = EbConfig::default();
    // Builder defaults match the plain defaults
    assert_eq!(config, EbConfigBuilder::default().build()?);
    // And the config survives serde
    let json = serde_json::to_string(&config).map_err(|e| e.to_string())?;
    let back: EbConfig = serde_json::from_str(&json).map_err(|e| e.to_string())?;
    assert_eq!(config, back);
    Ok(())
}

#[test]
fn it_builds_a_full_pattern() -> EbResult<()> {
    // A representative production run: a tiled bit-chain motif with block
    // markers and a chip marker, the whole field closing clean.
    let (dir, base, mut writer) = session(EbConfig::default())?;
    let grid = TileGridBuilder::default()
        .inner_cols(3usize)
        .inner_rows(3usize)
        .outer_cols(2usize)
        .outer_rows(2usize)
        .cell_width(5000.0)
        .cell_height(5000.0)
        .marker_dose(1.0)
        .build()?;
    writer.tile(&grid, |w, site| {
        // Dose and length sweep with the site indices
        let dose = 50.0 + 2.0 * site.cell_col as f64;
        let length = 65.0 + 5.0 * site.cell_row as f64;
        let mut chain = DotChain::new(4);
        chain.set_origin(0, 0.0, 0.0);
        chain.set_dot(0, 0, 0.0, 0.0, 160.0, 0.0, dose);
        chain.set_dot(0, 1, 250.0, -87.0, length, -86.0, dose);
        chain.set_dot(1, 2, 155.0, -86.0, length, 0.0, dose);
        chain.set_dot(2, 3, 155.0, -87.0, length, -86.0, dose);
        chain.draw(w, site.cx, site.cy)
    })?;
    writer.draw_chip_marker(3000.0, 0.5)?;
    let stats = writer.close()?;

    // 4 blocks x 9 cells x 4 dots, markers as in the 2x2 case, 4 chip bars
    assert_eq!(stats.accepted, 4 * 9 * 4 + 12 + 4);
    assert_eq!(stats.errors, 0);

    let text = fs::read_to_string(format!("{}.CC6", base))?;
    assert!(text.starts_with("PATTERN\r\n"));
    assert!(text.ends_with("END\r\n\u{1a}"));
    drop(dir);
    Ok(())
}
