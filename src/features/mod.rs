pub mod rca;
