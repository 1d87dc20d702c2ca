pub mod cargo;
pub mod cargo_location;
pub mod city;
pub mod city_zipcode;
pub mod company;
pub mod nearby_city;
pub mod vehicle;
pub mod vehicle_route_stop;
