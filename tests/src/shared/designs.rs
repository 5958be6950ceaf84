//! Physical databases used across the integration tests.

use anyhow::{anyhow, Result};
use arcstr::ArcStr;
use physdb::{Block, Database, InstId, IoType, LibId, SigType};

/// Adds the standard cell library: `NAND2` (A, B, Z) and `BUF` (A, Z),
/// both with `VDD` and `VSS` supply terminals.
pub fn stdcells(db: &mut Database) -> Result<LibId> {
    let lib = db.create_lib("stdcells")?;
    let nand2 = db.create_master(lib, "NAND2")?;
    db.create_mterm(nand2, "A", SigType::Signal, IoType::Input)?;
    db.create_mterm(nand2, "B", SigType::Signal, IoType::Input)?;
    db.create_mterm(nand2, "Z", SigType::Signal, IoType::Output)?;
    db.create_mterm(nand2, "VDD", SigType::Power, IoType::Inout)?;
    db.create_mterm(nand2, "VSS", SigType::Ground, IoType::Inout)?;

    let buf = db.create_master(lib, "BUF")?;
    db.create_mterm(buf, "A", SigType::Signal, IoType::Input)?;
    db.create_mterm(buf, "Z", SigType::Signal, IoType::Output)?;
    db.create_mterm(buf, "VDD", SigType::Power, IoType::Inout)?;
    db.create_mterm(buf, "VSS", SigType::Ground, IoType::Inout)?;
    Ok(lib)
}

fn block_of(db: &mut Database) -> Result<&mut Block> {
    db.block_mut().ok_or_else(|| anyhow!("no block"))
}

fn inst(db: &mut Database, master: &str, name: impl Into<ArcStr>) -> Result<InstId> {
    let master = db
        .find_master(master)
        .ok_or_else(|| anyhow!("no master `{master}`"))?;
    Ok(db.create_inst(master, name, None)?)
}

/// A flat design `top` with unconnected `BUF` instances `u1` through `u{count}`.
pub fn unconnected_bufs(count: usize) -> Result<Database> {
    let mut db = Database::new();
    stdcells(&mut db)?;
    db.create_block("top")?;
    for i in 1..=count {
        inst(&mut db, "BUF", arcstr::format!("u{i}"))?;
    }
    Ok(db)
}

/// A flat design with a physical library and no instances.
pub fn empty_flat() -> Result<Database> {
    unconnected_bufs(0)
}

/// A two-level design.
///
/// Top-level input `a` drives module net `top_net`, which enters module
/// instance `sub` (of `SUB`) through both `sub.in` and `sub.in2`. Inside,
/// both boundary terminals land on module net `in`, which feeds leaf
/// `sub/g1.A`. `sub/g1.Z` leaves through boundary terminal `out` onto top
/// module net `y` and top-level output `y`. The leaf and top-level terminals
/// are also on flat nets `top_net` and `y`.
pub fn two_level() -> Result<Database> {
    let mut db = Database::new();
    stdcells(&mut db)?;
    let buf = db.find_master("BUF").ok_or_else(|| anyhow!("no BUF"))?;

    let block = db.create_block("top")?;
    let top = block.top_module();
    let module = block.create_module("SUB")?;
    let sub = block.create_mod_inst(top, module, "sub")?;

    let inner = block.create_mod_net(module, "in")?;
    let out = block.create_mod_net(module, "out")?;
    let top_net = block.create_mod_net(top, "top_net")?;
    let y = block.create_mod_net(top, "y")?;

    for name in ["in", "in2"] {
        let boundary = block.create_mod_bterm(module, name)?;
        block.set_mod_bterm_types(boundary, SigType::Signal, IoType::Input);
        block.connect_mod_bterm(boundary, inner);
        let pin = block.create_mod_iterm(sub, name)?;
        block.connect_mod_iterm(pin, top_net);
    }
    let boundary = block.create_mod_bterm(module, "out")?;
    block.set_mod_bterm_types(boundary, SigType::Signal, IoType::Output);
    block.connect_mod_bterm(boundary, out);
    let pin = block.create_mod_iterm(sub, "out")?;
    block.connect_mod_iterm(pin, y);

    let flat_in = block.create_net("top_net")?;
    let flat_y = block.create_net("y")?;
    let a = block.create_bterm("a", Some(flat_in))?;
    block.set_bterm_types(a, SigType::Signal, IoType::Input);
    block.connect_bterm_mod_net(a, top_net);
    let y_term = block.create_bterm("y", Some(flat_y))?;
    block.set_bterm_types(y_term, SigType::Signal, IoType::Output);
    block.connect_bterm_mod_net(y_term, y);

    let g1 = db.create_inst(buf, "sub/g1", Some(module))?;
    let block = block_of(&mut db)?;
    let g1_a = block
        .find_iterm(g1, "A")
        .ok_or_else(|| anyhow!("no g1.A"))?;
    block.connect_iterm(g1_a, flat_in);
    block.connect_iterm_mod_net(g1_a, inner);
    let g1_z = block
        .find_iterm(g1, "Z")
        .ok_or_else(|| anyhow!("no g1.Z"))?;
    block.connect_iterm(g1_z, flat_y);
    block.connect_iterm_mod_net(g1_z, out);
    Ok(db)
}

/// A three-level module hierarchy with one leaf per level:
/// `u0` at the top, `mid/g0` in `MID`, and `mid/leaf/g2` in `LEAF`.
pub fn three_level() -> Result<Database> {
    let mut db = Database::new();
    stdcells(&mut db)?;
    let buf = db.find_master("BUF").ok_or_else(|| anyhow!("no BUF"))?;

    let block = db.create_block("top")?;
    let top = block.top_module();
    let mid = block.create_module("MID")?;
    let leaf = block.create_module("LEAF")?;
    block.create_mod_inst(top, mid, "mid")?;
    block.create_mod_inst(mid, leaf, "leaf")?;

    db.create_inst(buf, "u0", None)?;
    db.create_inst(buf, "mid/g0", Some(mid))?;
    db.create_inst(buf, "mid/leaf/g2", Some(leaf))?;
    Ok(db)
}
