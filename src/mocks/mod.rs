// Test doubles for the hardware and wireless collaborators.
pub mod mock_characteristic;
pub mod mock_clock;
pub mod mock_magnetometer;
