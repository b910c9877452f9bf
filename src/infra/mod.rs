pub mod atomic_file;
pub mod csv_output_adapter;
pub mod json_output_adapter;
pub mod rpc_client;
pub mod vesting_abi;
