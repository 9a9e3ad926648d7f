//! Messages of the `tracker.TrackerService` API (see `proto/tracker.proto`).

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LocationPing {
    #[prost(string, tag = "1")]
    pub vehicle_id: ::prost::alloc::string::String,
    #[prost(double, tag = "2")]
    pub latitude: f64,
    #[prost(double, tag = "3")]
    pub longitude: f64,
    #[prost(int64, tag = "4")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PingResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}
