fn main() -> anyhow::Result<()> {
    film_graph::main()
}
