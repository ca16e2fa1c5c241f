pub mod supabase;

pub use supabase::{Filter, SupabaseClient};
