//! TraCI protocol identifiers (SUMO numbering).
//!
//! Variable ids are only unique within one command domain, so the same byte
//! shows up under several names below.

// Control commands
pub const CMD_GETVERSION: u8 = 0x00;
pub const CMD_LOAD: u8 = 0x01;
pub const CMD_SIMSTEP: u8 = 0x02;
pub const CMD_SETORDER: u8 = 0x03;
pub const CMD_CLOSE: u8 = 0x7F;

// Variable retrieval; the response command id is the request id + RESPONSE_OFFSET
pub const CMD_GET_INDUCTIONLOOP_VARIABLE: u8 = 0xa0;
pub const CMD_GET_TL_VARIABLE: u8 = 0xa2;
pub const CMD_GET_LANE_VARIABLE: u8 = 0xa3;
pub const CMD_GET_VEHICLE_VARIABLE: u8 = 0xa4;
pub const CMD_GET_VEHICLETYPE_VARIABLE: u8 = 0xa5;
pub const CMD_GET_ROUTE_VARIABLE: u8 = 0xa6;
pub const CMD_GET_POI_VARIABLE: u8 = 0xa7;
pub const CMD_GET_POLYGON_VARIABLE: u8 = 0xa8;
pub const CMD_GET_JUNCTION_VARIABLE: u8 = 0xa9;
pub const CMD_GET_EDGE_VARIABLE: u8 = 0xaa;
pub const CMD_GET_SIM_VARIABLE: u8 = 0xab;

pub const RESPONSE_OFFSET: u8 = 0x10;

// State changes
pub const CMD_SET_TL_VARIABLE: u8 = 0xc2;
pub const CMD_SET_LANE_VARIABLE: u8 = 0xc3;
pub const CMD_SET_VEHICLE_VARIABLE: u8 = 0xc4;
pub const CMD_SET_VEHICLETYPE_VARIABLE: u8 = 0xc5;
pub const CMD_SET_ROUTE_VARIABLE: u8 = 0xc6;
pub const CMD_SET_POI_VARIABLE: u8 = 0xc7;
pub const CMD_SET_POLYGON_VARIABLE: u8 = 0xc8;
pub const CMD_SET_EDGE_VARIABLE: u8 = 0xca;
pub const CMD_SET_GUI_VARIABLE: u8 = 0xcc;

/// Commands answered by a status block alone, with no value command after it.
/// Hand-maintained: the response stream does not describe its own shape.
pub const STATUS_ONLY_COMMANDS: [u8; 12] = [
    CMD_LOAD,
    CMD_SETORDER,
    CMD_CLOSE,
    CMD_SET_TL_VARIABLE,
    CMD_SET_LANE_VARIABLE,
    CMD_SET_VEHICLE_VARIABLE,
    CMD_SET_VEHICLETYPE_VARIABLE,
    CMD_SET_ROUTE_VARIABLE,
    CMD_SET_POI_VARIABLE,
    CMD_SET_POLYGON_VARIABLE,
    CMD_SET_EDGE_VARIABLE,
    CMD_SET_GUI_VARIABLE,
];

pub fn is_status_only(command: u8) -> bool {
    STATUS_ONLY_COMMANDS.contains(&command)
}

// Result codes
pub const RTYPE_OK: u8 = 0x00;
pub const RTYPE_NOTIMPLEMENTED: u8 = 0x01;
pub const RTYPE_ERR: u8 = 0xFF;

// Value type tags
pub const POSITION_LON_LAT: u8 = 0x00;
pub const POSITION_2D: u8 = 0x01;
pub const POSITION_ROADMAP: u8 = 0x04;
pub const TYPE_BOUNDINGBOX: u8 = 0x05;
pub const TYPE_POLYGON: u8 = 0x06;
pub const TYPE_UBYTE: u8 = 0x07;
pub const TYPE_BYTE: u8 = 0x08;
pub const TYPE_INTEGER: u8 = 0x09;
pub const TYPE_FLOAT: u8 = 0x0A;
pub const TYPE_DOUBLE: u8 = 0x0B;
pub const TYPE_STRING: u8 = 0x0C;
pub const TYPE_STRINGLIST: u8 = 0x0E;
pub const TYPE_COMPOUND: u8 = 0x0F;
pub const TYPE_COLOR: u8 = 0x11;

// Common variables
pub const ID_LIST: u8 = 0x00;
pub const ID_COUNT: u8 = 0x01;

// Detector / edge / lane aggregates
pub const LAST_STEP_VEHICLE_NUMBER: u8 = 0x10;
pub const LAST_STEP_MEAN_SPEED: u8 = 0x11;
pub const LAST_STEP_VEHICLE_ID_LIST: u8 = 0x12;
pub const LAST_STEP_OCCUPANCY: u8 = 0x13;
pub const VAR_NAME: u8 = 0x1b;

// Traffic lights
pub const TL_RED_YELLOW_GREEN_STATE: u8 = 0x20;
pub const TL_PHASE_INDEX: u8 = 0x22;
pub const TL_PROGRAM: u8 = 0x23;
pub const TL_CONTROLLED_LANES: u8 = 0x26;
pub const TL_CURRENT_PHASE: u8 = 0x28;
pub const TL_CURRENT_PROGRAM: u8 = 0x29;
pub const TL_NEXT_SWITCH: u8 = 0x2d;

// Lanes
pub const LANE_LINK_NUMBER: u8 = 0x30;
pub const LANE_EDGE_ID: u8 = 0x31;

// Vehicles and shared attribute variables
pub const VAR_SPEED: u8 = 0x40;
pub const VAR_MAXSPEED: u8 = 0x41;
pub const VAR_POSITION: u8 = 0x42;
pub const VAR_ANGLE: u8 = 0x43;
pub const VAR_LENGTH: u8 = 0x44;
pub const VAR_COLOR: u8 = 0x45;
pub const VAR_SHAPE: u8 = 0x4e;
pub const VAR_TYPE: u8 = 0x4f;
pub const VAR_ROAD_ID: u8 = 0x50;
pub const VAR_LANE_ID: u8 = 0x51;
pub const VAR_LANE_INDEX: u8 = 0x52;
pub const VAR_ROUTE_ID: u8 = 0x53;
pub const VAR_EDGES: u8 = 0x54;
pub const VAR_LANEPOSITION: u8 = 0x56;
pub const VAR_EDGE_TRAVELTIME: u8 = 0x58;
pub const VAR_CO2EMISSION: u8 = 0x60;
pub const VAR_DISTANCE: u8 = 0x84;

// Vehicle state changes
pub const CMD_SLOWDOWN: u8 = 0x14;
pub const CMD_CHANGETARGET: u8 = 0x31;
pub const REMOVE: u8 = 0x81;
pub const ADD_FULL: u8 = 0x85;

// Vehicle removal reasons
pub const REMOVE_TELEPORT: u8 = 0x00;
pub const REMOVE_PARKING: u8 = 0x01;
pub const REMOVE_ARRIVED: u8 = 0x02;
pub const REMOVE_VAPORIZED: u8 = 0x03;
pub const REMOVE_TELEPORT_ARRIVED: u8 = 0x04;

// Simulation
pub const VAR_TIME: u8 = 0x66;
pub const VAR_LOADED_VEHICLES_IDS: u8 = 0x72;
pub const VAR_DEPARTED_VEHICLES_IDS: u8 = 0x74;
pub const VAR_TELEPORT_STARTING_VEHICLES_IDS: u8 = 0x76;
pub const VAR_TELEPORT_ENDING_VEHICLES_IDS: u8 = 0x78;
pub const VAR_ARRIVED_VEHICLES_IDS: u8 = 0x7a;
pub const VAR_DELTA_T: u8 = 0x7b;
pub const VAR_NET_BOUNDING_BOX: u8 = 0x7c;
pub const VAR_MIN_EXPECTED_VEHICLES: u8 = 0x7d;
