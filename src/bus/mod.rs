mod conductor;
mod frame;
mod port;

pub use conductor::{position_batches, BusConductor};
pub use frame::{
    check_write_response, generate_set_coils_request, generate_set_positions_request,
    generate_sync_request, parse_write_ack,
};
pub use port::{list_ports, open_serial_port, preflight_check};
