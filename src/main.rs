fn main() {
    planner_heatmap_lib::run()
}
