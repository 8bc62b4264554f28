mod common;
mod leases;
mod routing;
