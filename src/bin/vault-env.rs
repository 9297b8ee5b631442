fn main() -> color_eyre::eyre::Result<()> {
    vaultenv::cli::main()
}
