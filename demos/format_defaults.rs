//! Pack a few schema default values and print them the way a schema writer
//! would, followed by the envelope of a datagram carrying one of them.
//!
//! Run with `cargo run --example format_defaults`.

use chanwire::dclass::{Method, Struct, format_value_lossy};
use chanwire::{Datagram, DistributedType, MessageType, Value, pack_value};

fn main() -> chanwire::Result<()> {
    let position = DistributedType::from(
        Struct::new("Position")
            .with_field("x", DistributedType::Float32)
            .with_field("y", DistributedType::Float32)
            .with_field("h", DistributedType::Int16),
    );
    let set_name = DistributedType::from(
        Method::new()
            .with_parameter("name", DistributedType::VarString)
            .with_anonymous(DistributedType::Char),
    );
    let badges = DistributedType::var_array(DistributedType::UInt16);
    let token = DistributedType::Blob { size: 4 };

    let defaults = [
        (
            "position",
            &position,
            Value::Struct(vec![Value::Float(0.5), Value::Float(-12.0), Value::Int(90)]),
        ),
        (
            "setName",
            &set_name,
            Value::Method(vec![Value::string("Toon \"Jr\""), Value::Char(b'!')]),
        ),
        (
            "badges",
            &badges,
            Value::Array(vec![Value::UInt(1), Value::UInt(20), Value::UInt(300)]),
        ),
        ("token", &token, Value::blob(&[0xCA, 0xFE, 0x00, 0x01])),
    ];

    for (name, dtype, value) in &defaults {
        let mut dg = Datagram::new();
        pack_value(dtype, value, &mut dg)?;
        let literal = format_value_lossy(dtype, dg.as_slice());
        println!("{name:>10} {:<8} = {literal}", dtype.kind());
    }

    let set_field = MessageType::STATESERVER_OBJECT_SET_FIELD;
    let mut dg = Datagram::with_multi_header([4002, 4000, 5001], 12, set_field)?;
    pack_value(&badges, &defaults[2].2, &mut dg)?;
    let mut it = dg.iter();
    let envelope = it.read_envelope()?;
    println!(
        "\n{} bytes to {:?} from {:?}: {}",
        dg.len(),
        envelope.recipients(),
        envelope.sender(),
        envelope.msg_type()
    );

    Ok(())
}
