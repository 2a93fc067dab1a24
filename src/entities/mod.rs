pub mod audit_log;
pub mod department;
pub mod employee;
pub mod location;
pub mod product;
pub mod product_serial;
pub mod transaction;

pub use audit_log::Entity as AuditLog;
pub use department::Entity as Department;
pub use employee::Entity as Employee;
pub use location::Entity as Location;
pub use product::Entity as Product;
pub use product_serial::Entity as ProductSerial;
pub use transaction::Entity as Transaction;
