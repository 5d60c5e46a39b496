mod bundle;
mod keygen;
mod lifecycle;

pub use bundle::{parse_bundle, serial_to_id};
pub use keygen::{
    EC_KEY_SIZES, RSA_KEY_SIZES, check_key_size, generate_credential, generate_key, self_sign,
};
pub use lifecycle::{KeyLifecycleManager, ROTATION_INTERVAL};
