//! Demo gateway: composes the sample books and authors subschemas and serves
//! the result over HTTP (GraphiQL on GET `/graphql`, execution on POST).

mod authors;
mod books;

use {
    async_graphql::{dynamic::Schema, http::GraphiQLSource},
    async_graphql_axum::{GraphQLRequest, GraphQLResponse},
    axum::{
        Router,
        extract::State,
        response::{Html, IntoResponse},
        routing::get,
    },
    clap::Parser,
    graphweld_stitch::{ExtensionField, Federation, Join, TypeExpr},
};

#[derive(Parser)]
#[command(name = "graphweld-server", about = "Composed books + authors GraphQL gateway")]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 4000, env = "GRAPHWELD_PORT")]
    port: u16,
}

async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let schema = Federation::new()
        .subschema(books::subschema()?)
        .subschema(authors::subschema()?)
        .extend(ExtensionField::new(
            "books",
            "Book",
            "authors",
            TypeExpr::named_nn_list_nn("Author"),
            Join::new("authorUuids", "authors", "authorsByUuids", "uuids"),
        ))
        .compose()?;

    let app = Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .with_state(schema);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(port = args.port, "graphweld server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
