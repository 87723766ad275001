mod decision_loop;
