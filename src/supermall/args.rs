use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "supermall")]
#[command(about = "Record store and demo catalog for the mall storefront", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print the raw {success, data | error} response as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create missing collections and seed demo data (if enabled)
    Init,

    /// List every record of a collection
    #[command(alias = "ls")]
    List {
        /// Collection name (shops, products, offers, categories, users)
        collection: String,
    },

    /// Show one record
    Get { collection: String, id: String },

    /// Create a record from a JSON object
    #[command(alias = "n")]
    Create {
        collection: String,

        /// Record fields as a JSON object; id and timestamps are generated
        data: String,
    },

    /// Merge a JSON object into an existing record
    #[command(alias = "u")]
    Update {
        collection: String,
        id: String,

        /// Fields to change as a JSON object
        patch: String,
    },

    /// Delete a record (deleting a missing id succeeds)
    #[command(alias = "rm")]
    Delete { collection: String, id: String },

    /// Records whose fields equal every given value
    #[command(alias = "q")]
    Query {
        collection: String,

        /// Conditions as field=value; values are parsed as JSON, else taken as text
        #[arg(num_args = 0..)]
        conditions: Vec<String>,
    },

    /// Counts for the admin dashboard
    Stats,

    /// Browse products
    Products {
        /// Case-insensitive name search
        #[arg(short, long)]
        search: Option<String>,

        /// Category id (e.g. cat_1)
        #[arg(short, long)]
        category: Option<String>,

        /// Shop id
        #[arg(long)]
        shop: Option<String>,

        /// name-asc, name-desc, price-asc or price-desc
        #[arg(long)]
        sort: Option<String>,

        /// Show at most this many
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Browse offers (running ones only, unless --all)
    Offers {
        /// Case-insensitive title search
        #[arg(short, long)]
        search: Option<String>,

        /// Shop id
        #[arg(long)]
        shop: Option<String>,

        /// discount-desc, discount-asc, newest or ending-soon
        #[arg(long)]
        sort: Option<String>,

        /// Include inactive and expired offers
        #[arg(long)]
        all: bool,

        /// Show at most this many
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Browse shops
    Shops {
        /// Case-insensitive name search (name or description with --storefront)
        #[arg(short, long)]
        search: Option<String>,

        /// Category id (e.g. cat_1)
        #[arg(short, long)]
        category: Option<String>,

        /// Floor name (e.g. "Ground Floor")
        #[arg(short, long)]
        floor: Option<String>,

        /// name-asc, name-desc or newest
        #[arg(long)]
        sort: Option<String>,

        /// Only active shops, as customers see them
        #[arg(long)]
        storefront: bool,

        /// Show at most this many
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Compare products side by side
    Compare {
        /// Product ids, at least two
        #[arg(num_args = 1..)]
        ids: Vec<String>,
    },

    /// Shop and offer counts per floor
    Floors,

    /// Show, filter, export or clear the application log
    Logs {
        /// Only entries of this level (info, warning, error, debug)
        #[arg(short, long)]
        level: Option<String>,

        /// Print all entries as pretty JSON
        #[arg(long, conflicts_with = "clear")]
        export: bool,

        /// Remove every entry
        #[arg(long)]
        clear: bool,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., seed-demo-data)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
