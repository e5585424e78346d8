pub mod contact;
pub mod order;
pub mod product;
pub mod user;

pub use contact::{ContactInput, ContactMessage};
pub use order::{NewOrder, Order, OrderInput, OrderItem, OrderItemInput, OrderStatus};
pub use product::{NewProduct, Product, ProductQuery};
pub use user::{normalize_email, NewUser, User};
